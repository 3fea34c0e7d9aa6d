//! Fake LDAP directory for integration tests.
//!
//! Answers simple binds from a fixed account table over loopback TCP. Only
//! the BER needed for a bind exchange is understood.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_ENUMERATED: u8 = 0x0a;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_BIND_REQUEST: u8 = 0x60;
const TAG_BIND_RESPONSE: u8 = 0x61;
const TAG_SIMPLE_AUTH: u8 = 0x80;

/// Directory server answering simple binds.
pub struct FakeLdap {
    pub port: u16,
    binds: Arc<AtomicU32>,
}

impl FakeLdap {
    pub async fn start(accounts: &[(&str, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake LDAP listener");
        let port = listener.local_addr().unwrap().port();
        let accounts: Arc<HashMap<String, String>> = Arc::new(
            accounts
                .iter()
                .map(|(u, p)| (u.to_string(), p.to_string()))
                .collect(),
        );
        let binds = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&binds);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let accounts = Arc::clone(&accounts);
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let _ = serve(socket, &accounts, &counter).await;
                });
            }
        });

        Self { port, binds }
    }

    /// Number of bind requests received so far.
    pub fn binds(&self) -> u32 {
        self.binds.load(Ordering::SeqCst)
    }
}

async fn serve(
    mut socket: TcpStream,
    accounts: &HashMap<String, String>,
    binds: &AtomicU32,
) -> TestResult<()> {
    let (tag, content) = read_element(&mut socket).await?;
    if tag != TAG_SEQUENCE {
        return Err(format!("expected LDAPMessage, found tag 0x{:02x}", tag).into());
    }
    let (id, rest) = expect_tlv(&content, TAG_INTEGER)?;
    let (bind, _controls) = expect_tlv(rest, TAG_BIND_REQUEST)?;
    let (_version, rest) = expect_tlv(bind, TAG_INTEGER)?;
    let (name, rest) = expect_tlv(rest, TAG_OCTET_STRING)?;
    let (password, _) = expect_tlv(rest, TAG_SIMPLE_AUTH)?;
    binds.fetch_add(1, Ordering::SeqCst);

    let name = String::from_utf8_lossy(name).to_lowercase();
    let accepted = accounts
        .get(&name)
        .map(|expected| expected.as_bytes() == password)
        .unwrap_or(false);

    let (code, diagnostic) = if accepted {
        (0, "")
    } else {
        (49, "80090308: LdapErr: DSID-0C09042A, data 52e")
    };
    socket
        .write_all(&bind_response(id, code, diagnostic))
        .await?;

    // Wait for the unbind and close
    let mut rest = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), socket.read_to_end(&mut rest)).await;
    Ok(())
}

/// `LDAPMessage { id, BindResponse { code, "", diagnostic } }`, echoing the
/// request's message id bytes.
fn bind_response(message_id: &[u8], code: u8, diagnostic: &str) -> Vec<u8> {
    let mut response = Vec::new();
    push_tlv(TAG_ENUMERATED, &[code], &mut response);
    push_tlv(TAG_OCTET_STRING, b"", &mut response);
    push_tlv(TAG_OCTET_STRING, diagnostic.as_bytes(), &mut response);

    let mut message = Vec::new();
    push_tlv(TAG_INTEGER, message_id, &mut message);
    push_tlv(TAG_BIND_RESPONSE, &response, &mut message);

    let mut out = Vec::new();
    push_tlv(TAG_SEQUENCE, &message, &mut out);
    out
}

fn push_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = (len as u32).to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (4 - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(content);
}

/// Split one element off `buf`, requiring `tag`. Returns `(content, rest)`.
fn expect_tlv(buf: &[u8], tag: u8) -> TestResult<(&[u8], &[u8])> {
    if buf.len() < 2 {
        return Err("truncated element".into());
    }
    if buf[0] != tag {
        return Err(format!("expected tag 0x{:02x}, found 0x{:02x}", tag, buf[0]).into());
    }

    let first = buf[1];
    let (len, body) = if first < 0x80 {
        (first as usize, &buf[2..])
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || buf.len() < 2 + count {
            return Err("unsupported length encoding".into());
        }
        let len = buf[2..2 + count]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &buf[2 + count..])
    };

    if body.len() < len {
        return Err("element longer than buffer".into());
    }
    Ok((&body[..len], &body[len..]))
}

/// Read one complete element from a stream. Returns `(tag, content)`.
async fn read_element<R: AsyncRead + Unpin>(reader: &mut R) -> TestResult<(u8, Vec<u8>)> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).await?;
    let [tag, first] = header;

    let len = if first < 0x80 {
        first as usize
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 {
            return Err("unsupported length encoding".into());
        }
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf[4 - count..]).await?;
        u32::from_be_bytes(len_buf) as usize
    };

    let mut content = vec![0u8; len];
    reader.read_exact(&mut content).await?;
    Ok((tag, content))
}
