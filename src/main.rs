//! NetAPI Gatekeeper - operator tool for the credential gatekeeper.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;
use zeroize::Zeroizing;

use netapi_gatekeeper::config::Settings;
use netapi_gatekeeper::error::GatekeeperError;
use netapi_gatekeeper::secrets::{EncryptedSecret, MasterKey, SecretCipher};
use netapi_gatekeeper::{Gatekeeper, RequestContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "netapi-gatekeeper", version, about = "NetAPI credential gatekeeper")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "/etc/netapi/gatekeeper.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a device password read from stdin
    Encrypt,

    /// Decrypt a stored device password
    Decrypt {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        salt: String,
    },

    /// Authenticate an Authorization header against the directory
    CheckAuth {
        /// Header value, e.g. "Basic YWxpY2U6cGFzc3dvcmQ="
        #[arg(long)]
        header: String,
        /// Caller address to record in the audit log
        #[arg(long)]
        source: Option<String>,
    },

    /// Retrieve the password of a registered device
    DeviceSecret {
        device_id: String,
        /// Print the decrypted password
        #[arg(long)]
        show: bool,
        /// Caller address to record in the audit log
        #[arg(long)]
        source: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);
    info!("Configuration loaded from: {}", cli.config.display());

    // The master key is required by every command; fail before doing anything else
    let master_key = match MasterKey::from_env_var(&settings.security.master_key_env) {
        Ok(key) => Arc::new(key),
        Err(e) => {
            error!(error = %e, "Master key unavailable");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command, settings, master_key)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), error = %e, "Command failed");
            eprintln!("{}: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    settings: Settings,
    master_key: Arc<MasterKey>,
) -> Result<(), GatekeeperError> {
    match command {
        Command::Encrypt => {
            let cipher = SecretCipher::new(master_key, settings.security.kdf_iterations)?;
            let password = read_password()?;
            let sealed = cipher.encrypt(&password)?;
            println!("secret: {}", sealed.secret);
            println!("salt: {}", sealed.salt);
        }
        Command::Decrypt { secret, salt } => {
            let cipher = SecretCipher::new(master_key, settings.security.kdf_iterations)?;
            let password = cipher.decrypt(&EncryptedSecret { secret, salt })?;
            println!("{}", password.expose());
        }
        Command::CheckAuth { header, source } => {
            let gatekeeper = Gatekeeper::from_settings(&settings, master_key)?;
            let user = gatekeeper
                .authenticate_header_from(Some(&header), &request_context(source))
                .await?;
            println!("authenticated: {} ({})", user.username, user.upn);
        }
        Command::DeviceSecret {
            device_id,
            show,
            source,
        } => {
            let gatekeeper = Gatekeeper::from_settings(&settings, master_key)?;
            let login = gatekeeper.device_login_from(&device_id, &request_context(source))?;
            println!("device: {}", login.device_id);
            println!("host: {}", login.host);
            if let Some(username) = &login.username {
                println!("username: {}", username);
            }
            if show {
                println!("password: {}", login.password.expose());
            } else {
                println!("password: [decrypted, use --show to print]");
            }
        }
    }

    Ok(())
}

/// Audit context for a CLI invocation.
fn request_context(source: Option<String>) -> RequestContext {
    let request = RequestContext::new().with_request_id(Uuid::new_v4());
    match source {
        Some(source) => request.with_source(source),
        None => request,
    }
}

/// Read one line from stdin, without the trailing newline.
fn read_password() -> Result<Zeroizing<String>, GatekeeperError> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut line)?;

    let password = Zeroizing::new(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string());
    if password.is_empty() {
        return Err(GatekeeperError::Config {
            message: "No password given on stdin".to_string(),
        });
    }
    Ok(password)
}

/// Initialize logging based on settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
