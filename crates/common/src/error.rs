//! Common error type shared across crates.

use thiserror::Error;

/// Top-level error type for every driver operation.
///
/// Variants map to stable machine-readable codes via [`CryptError::code`]:
/// - construction failures ([`CryptError::UnsupportedCipher`], [`CryptError::KeyFormat`])
///   are fatal for the driver and must not be retried
/// - envelope failures ([`CryptError::InvalidPayload`], [`CryptError::InvalidMac`])
///   mean the input was malformed or tampered with
/// - primitive failures ([`CryptError::Decryption`], [`CryptError::Rsa`]) are terminal
///   for that call only
#[derive(Debug, Error)]
pub enum CryptError {
    /// The key length does not match the requested cipher.
    #[error(
        "unsupported cipher: the only supported ciphers are AES-128-CBC and AES-256-CBC with the correct key lengths"
    )]
    UnsupportedCipher,

    /// Key material could not be read or parsed as the expected key type.
    #[error("invalid key material: {0}")]
    KeyFormat(String),

    /// The envelope is not valid base64 JSON, is missing a field, or carries a bad IV.
    #[error("the payload is invalid")]
    InvalidPayload,

    /// The envelope MAC does not match its contents.
    #[error("the MAC is invalid")]
    InvalidMac,

    /// Symmetric decryption or decoding of the plaintext failed.
    #[error("could not decrypt the data: {0}")]
    Decryption(String),

    /// The RSA primitive reported a failure (encrypt, decrypt, or sign).
    #[error("rsa operation failed: {0}")]
    Rsa(String),

    /// No driver is registered under the requested name.
    #[error("driver [{0}] does not exist")]
    DriverNotFound(String),

    /// The resolved driver does not provide the requested capability.
    #[error("driver [{0}] does not provide the requested capability")]
    DriverContract(String),

    /// The driver configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CryptError {
    /// Returns a short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CryptError::UnsupportedCipher => "unsupported_cipher",
            CryptError::KeyFormat(_) => "key_format",
            CryptError::InvalidPayload => "invalid_payload",
            CryptError::InvalidMac => "invalid_mac",
            CryptError::Decryption(_) => "decryption_failed",
            CryptError::Rsa(_) => "rsa_failure",
            CryptError::DriverNotFound(_) => "driver_not_found",
            CryptError::DriverContract(_) => "driver_contract",
            CryptError::Config(_) => "config",
        }
    }

    /// Returns `true` if the error happened while building a driver rather
    /// than while processing a single payload.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CryptError::UnsupportedCipher
                | CryptError::KeyFormat(_)
                | CryptError::DriverNotFound(_)
                | CryptError::DriverContract(_)
                | CryptError::Config(_)
        )
    }
}
