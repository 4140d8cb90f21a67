//! Driver configuration.
//!
//! One mapping configures every driver, so the same settings can be handed to
//! [`crate::Crypt`] regardless of which driver is later requested:
//!
//! | field | AES driver | RSA driver |
//! |---|---|---|
//! | `key` | symmetric key | keyed-MD5 signing secret |
//! | `cipher` | `AES-128-CBC` (default) or `AES-256-CBC` | unused |
//! | `public_key` | unused | PEM path or base64 body |
//! | `private_key` | unused | PEM path or base64 body |
//!
//! From the environment the fields are read as `PAYCRYPT_KEY`,
//! `PAYCRYPT_CIPHER`, `PAYCRYPT_PUBLIC_KEY` and `PAYCRYPT_PRIVATE_KEY`.

use std::fmt;

use paycrypt_common::CryptError;
use serde::Deserialize;

use crate::asymmetric::AsymmetricKeyConfig;
use crate::symmetric::{Cipher, SymmetricKeyConfig};

/// Prefix of every environment variable read by [`DriverConfig::from_env`].
pub const ENV_PREFIX: &str = "PAYCRYPT";

/// Configuration mapping shared by all drivers.
#[derive(Clone, Default, Deserialize)]
pub struct DriverConfig {
    /// Symmetric key, or the signing secret for the RSA driver.
    #[serde(default)]
    pub key: Option<String>,

    /// Block cipher name for the AES driver.
    #[serde(default)]
    pub cipher: Option<String>,

    /// RSA public key input.
    #[serde(default, alias = "publicKey")]
    pub public_key: Option<String>,

    /// RSA private key input.
    #[serde(default, alias = "privateKey")]
    pub private_key: Option<String>,
}

impl DriverConfig {
    /// Configuration for the AES driver.
    pub fn symmetric(key: impl Into<String>, cipher: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            cipher: Some(cipher.into()),
            ..Self::default()
        }
    }

    /// Configuration for the RSA driver, without a signing secret.
    pub fn asymmetric(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            private_key: Some(private_key.into()),
            ..Self::default()
        }
    }

    /// Set `key` (the symmetric key or the signing secret).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Load configuration from `PAYCRYPT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Config`] if the environment cannot be read or
    /// deserialised.
    pub fn from_env() -> Result<Self, CryptError> {
        Self::from_source(None)
    }

    /// Same as [`DriverConfig::from_env`], reading from `source` instead of
    /// the process environment when it is `Some`.
    pub(crate) fn from_source(source: Option<config::Map<String, String>>) -> Result<Self, CryptError> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .source(source),
            )
            .build()
            .map_err(|e| CryptError::Config(format!("failed to read environment: {e}")))?;

        cfg.try_deserialize()
            .map_err(|e| CryptError::Config(format!("failed to deserialise driver configuration: {e}")))
    }

    /// Resolve the symmetric key configuration.
    ///
    /// A missing key is treated as an empty key, so it fails the key/cipher
    /// check like any other wrong-length key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::UnsupportedCipher`] for an unknown cipher name.
    pub fn symmetric_keys(&self) -> Result<SymmetricKeyConfig, CryptError> {
        let cipher = match self.cipher.as_deref() {
            Some(name) => name.parse()?,
            None => Cipher::default(),
        };
        let key = self.key.clone().unwrap_or_default().into_bytes();
        Ok(SymmetricKeyConfig::new(key, cipher))
    }

    /// Resolve the asymmetric key configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::KeyFormat`] if either key is not configured.
    pub fn asymmetric_keys(&self) -> Result<AsymmetricKeyConfig, CryptError> {
        let public_key = self
            .public_key
            .clone()
            .ok_or_else(|| CryptError::KeyFormat("public key is not configured".into()))?;
        let private_key = self
            .private_key
            .clone()
            .ok_or_else(|| CryptError::KeyFormat("private key is not configured".into()))?;
        Ok(AsymmetricKeyConfig {
            public_key,
            private_key,
            signing_secret: self.key.clone(),
        })
    }
}

impl fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverConfig")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("cipher", &self.cipher)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
