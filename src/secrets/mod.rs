//! Device secret storage.
//!
//! Holds the master key, the cipher that seals and opens stored device
//! passwords, and the registry those records are looked up in.

mod cipher;
mod master_key;
mod registry;

pub use cipher::{DeviceSecret, EncryptedSecret, SecretCipher, ENVELOPE_VERSION, SALT_LEN};
pub use master_key::{MasterKey, MASTER_KEY_ENV};
pub use registry::{DeviceAuthType, DeviceCredentialRecord, DeviceRegistry, InMemoryRegistry};
