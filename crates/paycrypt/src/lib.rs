//! `paycrypt`: symmetric and asymmetric crypto drivers behind one contract.
//!
//! Two drivers are provided:
//!
//! - [`AesDriver`]: AES-CBC with a legacy fixed-IV hex mode and an
//!   HMAC-SHA256 protected envelope mode.
//! - [`RsaDriver`]: RSA PKCS#1 v1.5 encryption, keyed-MD5 canonical request
//!   signatures, and SHA-256 RSA signatures.
//!
//! Both implement [`CryptoDriver`]. [`Crypt`] builds a driver by name from a
//! shared [`DriverConfig`].
//!
//! ```no_run
//! use paycrypt::{Crypt, CryptoDriver, DriverConfig};
//!
//! let crypt = Crypt::new(DriverConfig::symmetric("0123456789abcdef", "AES-128-CBC"));
//! let aes = crypt.create_aes("aes")?;
//! let hex = aes.encrypt(b"hello")?;
//! assert_eq!(aes.decrypt(&hex)?, b"hello");
//! # Ok::<(), paycrypt::CryptError>(())
//! ```

pub mod asymmetric;
pub mod config;
pub mod driver;
pub mod keys;
pub mod symmetric;

pub use asymmetric::{AsymmetricKeyConfig, RsaDriver, SignParams};
pub use config::DriverConfig;
pub use driver::{Crypt, CryptoDriver, Driver, DriverKind};
pub use paycrypt_common::{CryptError, Envelope};
pub use symmetric::{AesDriver, Cipher, SymmetricKeyConfig};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CryptError>;
