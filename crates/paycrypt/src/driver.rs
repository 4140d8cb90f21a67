//! The [`CryptoDriver`] contract and the name-based driver factory.
//!
//! Driver names resolve to a closed set of [`DriverKind`]s. Lookup ignores
//! ASCII case and `-`/`_` separators, so `"aes"`, `"AES"` and `"Aes"` all
//! name the same driver.

use std::fmt;
use std::str::FromStr;

use paycrypt_common::CryptError;
use tracing::debug;

use crate::asymmetric::RsaDriver;
use crate::config::DriverConfig;
use crate::symmetric::AesDriver;

/// Uniform encrypt/decrypt capability implemented by every driver.
///
/// `decrypt(encrypt(p)) == p` holds for the same key configuration. Input
/// produced elsewhere is decrypted on a best-effort basis and may fail.
pub trait CryptoDriver: Send + Sync {
    /// Short registry name of the driver.
    fn name(&self) -> &'static str;

    /// Encrypt `plaintext`. The output encoding is driver-specific text.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptError>;

    /// Decrypt output previously produced by [`CryptoDriver::encrypt`].
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptError>;
}

/// Every driver the factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// [`AesDriver`].
    Aes,
    /// [`RsaDriver`].
    Rsa,
}

impl DriverKind {
    /// All known kinds.
    pub const ALL: [DriverKind; 2] = [DriverKind::Aes, DriverKind::Rsa];

    /// Registry name.
    pub const fn name(self) -> &'static str {
        match self {
            DriverKind::Aes => "aes",
            DriverKind::Rsa => "rsa",
        }
    }

    /// Resolve a driver name.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::DriverNotFound`] if no driver has that name.
    pub fn resolve(name: &str) -> Result<Self, CryptError> {
        let normalised: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalised)
            .ok_or_else(|| CryptError::DriverNotFound(name.to_owned()))
    }

    fn build(self, config: &DriverConfig) -> Result<Driver, CryptError> {
        match self {
            DriverKind::Aes => AesDriver::new(config.symmetric_keys()?).map(Driver::Aes),
            DriverKind::Rsa => RsaDriver::new(config.asymmetric_keys()?).map(Driver::Rsa),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DriverKind {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// A constructed driver of any kind.
#[derive(Debug)]
pub enum Driver {
    Aes(AesDriver),
    Rsa(RsaDriver),
}

impl Driver {
    /// Which kind of driver this is.
    pub fn kind(&self) -> DriverKind {
        match self {
            Driver::Aes(_) => DriverKind::Aes,
            Driver::Rsa(_) => DriverKind::Rsa,
        }
    }

    /// Unwrap the symmetric driver.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::DriverContract`] if this is not an AES driver.
    pub fn into_aes(self) -> Result<AesDriver, CryptError> {
        match self {
            Driver::Aes(aes) => Ok(aes),
            other => Err(CryptError::DriverContract(other.kind().to_string())),
        }
    }

    /// Unwrap the asymmetric driver.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::DriverContract`] if this is not an RSA driver.
    pub fn into_rsa(self) -> Result<RsaDriver, CryptError> {
        match self {
            Driver::Rsa(rsa) => Ok(rsa),
            other => Err(CryptError::DriverContract(other.kind().to_string())),
        }
    }

    fn inner(&self) -> &dyn CryptoDriver {
        match self {
            Driver::Aes(aes) => aes,
            Driver::Rsa(rsa) => rsa,
        }
    }
}

impl CryptoDriver for Driver {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptError> {
        self.inner().encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptError> {
        self.inner().decrypt(ciphertext)
    }
}

/// Factory that builds drivers by name from one shared [`DriverConfig`].
#[derive(Debug, Clone, Default)]
pub struct Crypt {
    config: DriverConfig,
}

impl Crypt {
    /// Create a factory over `config`.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Create a factory from `PAYCRYPT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Config`] if the environment cannot be read.
    pub fn from_env() -> Result<Self, CryptError> {
        DriverConfig::from_env().map(Self::new)
    }

    /// The configuration drivers are built from.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Build the driver registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`CryptError::DriverNotFound`] for an unknown name.
    /// - Any construction error of the driver itself
    ///   ([`CryptError::UnsupportedCipher`], [`CryptError::KeyFormat`]).
    pub fn create(&self, name: &str) -> Result<Driver, CryptError> {
        let kind = DriverKind::resolve(name)?;
        debug!(driver = %kind, "creating driver");
        kind.build(&self.config)
    }

    /// Build the driver under `name`, requiring it to be the AES driver.
    ///
    /// # Errors
    ///
    /// As [`Crypt::create`], plus [`CryptError::DriverContract`] if `name`
    /// resolves to another kind.
    pub fn create_aes(&self, name: &str) -> Result<AesDriver, CryptError> {
        let kind = DriverKind::resolve(name)?;
        if kind != DriverKind::Aes {
            return Err(CryptError::DriverContract(name.to_owned()));
        }
        self.create(name)?.into_aes()
    }

    /// Build the driver under `name`, requiring it to be the RSA driver.
    ///
    /// # Errors
    ///
    /// As [`Crypt::create`], plus [`CryptError::DriverContract`] if `name`
    /// resolves to another kind.
    pub fn create_rsa(&self, name: &str) -> Result<RsaDriver, CryptError> {
        let kind = DriverKind::resolve(name)?;
        if kind != DriverKind::Rsa {
            return Err(CryptError::DriverContract(name.to_owned()));
        }
        self.create(name)?.into_rsa()
    }
}
