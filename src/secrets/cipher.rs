//! Device password encryption.
//!
//! Keys are derived per record with PBKDF2-HMAC-SHA256 from the master key
//! and a random 16-byte salt, then used with AES-256-GCM.
//!
//! # Stored format
//!
//! ```text
//! secret = v1.<base64url-no-pad(nonce || ciphertext || tag)>
//! salt   = <base64url(salt)>
//! ```
//!
//! The salt is kept in its own field so that it fits the device table's
//! salt column as-is.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{GatekeeperError, SecretErrorKind};

use super::MasterKey;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Current envelope version prefix.
pub const ENVELOPE_VERSION: &str = "v1";

const KEY_LEN: usize = 32;

/// An encrypted device password as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// Versioned ciphertext envelope.
    pub secret: String,
    /// Base64url-encoded KDF salt.
    pub salt: String,
}

/// A decrypted device password.
///
/// Wiped on drop and redacted from `Debug`. Use [`DeviceSecret::expose`]
/// at the point the password is handed to a device session.
pub struct DeviceSecret {
    password: Zeroizing<String>,
}

impl DeviceSecret {
    pub(crate) fn new(password: String) -> Self {
        Self {
            password: Zeroizing::new(password),
        }
    }

    /// Borrow the cleartext password.
    pub fn expose(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceSecret([REDACTED])")
    }
}

/// Encrypts and decrypts device passwords under the master key.
pub struct SecretCipher {
    master_key: Arc<MasterKey>,
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl SecretCipher {
    /// Create a cipher using the given PBKDF2 iteration count.
    pub fn new(master_key: Arc<MasterKey>, iterations: u32) -> Result<Self, GatekeeperError> {
        let iterations = NonZeroU32::new(iterations).ok_or_else(|| GatekeeperError::Config {
            message: "KDF iteration count must be greater than 0".to_string(),
        })?;

        Ok(Self {
            master_key,
            iterations,
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a device password with a fresh salt and nonce.
    ///
    /// # Arguments
    ///
    /// * `password` - Cleartext device password
    ///
    /// # Errors
    ///
    /// Returns `ENCRYPTION_ERROR` if the system RNG fails or sealing fails.
    pub fn encrypt(&self, password: &str) -> Result<EncryptedSecret, GatekeeperError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| encryption_error("salt generation failed"))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| encryption_error("nonce generation failed"))?;

        let key = self.derive_key(&salt)?;

        // Seal in place; the tag is appended to the ciphertext
        let mut in_out = Zeroizing::new(password.as_bytes().to_vec());
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut *in_out,
        )
        .map_err(|_| encryption_error("AES-256-GCM seal failed"))?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&in_out);

        Ok(EncryptedSecret {
            secret: format!("{}.{}", ENVELOPE_VERSION, URL_SAFE_NO_PAD.encode(&envelope)),
            salt: URL_SAFE.encode(salt),
        })
    }

    /// Decrypt a stored device password.
    ///
    /// Nothing is returned on failure.
    ///
    /// # Arguments
    ///
    /// * `encrypted` - Stored secret and salt of one device
    ///
    /// # Errors
    ///
    /// Returns `DECRYPTION_ERROR` if:
    /// - The envelope version is missing or unknown
    /// - The salt or ciphertext is not valid base64url, or has the wrong length
    /// - Authentication fails (wrong master key or altered data)
    /// - The plaintext is not valid UTF-8
    pub fn decrypt(&self, encrypted: &EncryptedSecret) -> Result<DeviceSecret, GatekeeperError> {
        // Check envelope version
        let (version, body) = encrypted
            .secret
            .split_once('.')
            .ok_or_else(|| GatekeeperError::decryption("missing envelope version"))?;

        if version != ENVELOPE_VERSION {
            return Err(GatekeeperError::decryption(format!(
                "unsupported envelope version '{}'",
                version
            )));
        }

        // Decode salt and envelope
        let salt = URL_SAFE
            .decode(encrypted.salt.trim())
            .map_err(|e| GatekeeperError::decryption(format!("invalid salt encoding: {}", e)))?;
        if salt.len() != SALT_LEN {
            return Err(GatekeeperError::decryption(format!(
                "salt must be {} bytes, got {}",
                SALT_LEN,
                salt.len()
            )));
        }

        let mut raw = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(body)
                .map_err(|e| GatekeeperError::decryption(format!("invalid ciphertext encoding: {}", e)))?,
        );
        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(GatekeeperError::decryption("ciphertext too short"));
        }

        let key = self.derive_key(&salt)?;

        let (nonce_bytes, sealed) = raw.split_at_mut(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| GatekeeperError::decryption("invalid nonce"))?;

        let plaintext = key
            .open_in_place(nonce, Aad::empty(), sealed)
            .map_err(|_| GatekeeperError::decryption("authentication failed (wrong master key or corrupted ciphertext)"))?;

        let password = std::str::from_utf8(plaintext)
            .map_err(|_| GatekeeperError::decryption("plaintext is not valid UTF-8"))?
            .to_string();

        Ok(DeviceSecret::new(password))
    }

    fn derive_key(&self, salt: &[u8]) -> Result<LessSafeKey, GatekeeperError> {
        let mut key_bytes = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            self.master_key.expose(),
            &mut key_bytes[..],
        );

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes[..])
            .map_err(|_| GatekeeperError::decryption("derived key rejected"))?;
        Ok(LessSafeKey::new(unbound))
    }
}

fn encryption_error(reason: &str) -> GatekeeperError {
    GatekeeperError::Secret {
        kind: SecretErrorKind::Encryption {
            reason: reason.to_string(),
        },
    }
}
