//! RSA driver: PKCS#1 v1.5 encryption plus two request-signing protocols.
//!
//! - **Keyed MD5** ([`RsaDriver::generate_sign`]): uppercase hex MD5 of the
//!   canonical content with `&key=<secret>` appended. Not an RSA signature.
//! - **RSA/SHA-256** ([`RsaDriver::generate_rsa_sign`]): PKCS#1 v1.5 signature
//!   over the uppercase hex MD5 of the canonical content (no secret suffix),
//!   base64 encoded. Counterparts expect exactly this digest string as the
//!   signed message.
//!
//! RSA primitive failures surface as [`CryptError::Rsa`] so callers can tell
//! them apart from every other error; verification never errors and simply
//! returns `false`.

pub mod sign;

pub use sign::{SignParams, SIGN_FIELD};

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use paycrypt_common::CryptError;
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;

use crate::driver::CryptoDriver;
use crate::keys;
use sign::md5_upper;

/// Key inputs for an [`RsaDriver`].
#[derive(Clone, Default)]
pub struct AsymmetricKeyConfig {
    /// PEM file path or bare base64 SPKI body.
    pub public_key: String,
    /// PEM file path or bare base64 PKCS#8 body.
    pub private_key: String,
    /// Secret appended as `&key=<secret>` by the keyed-MD5 signature.
    pub signing_secret: Option<String>,
}

impl fmt::Debug for AsymmetricKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricKeyConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// RSA driver. Keys are loaded once and never mutated.
pub struct RsaDriver {
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
    signing_key: SigningKey<Sha256>,
    verifying_key: VerifyingKey<Sha256>,
    signing_secret: Option<String>,
}

impl RsaDriver {
    /// Load both keys and build the driver.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::KeyFormat`] if either key cannot be loaded.
    pub fn new(config: AsymmetricKeyConfig) -> Result<Self, CryptError> {
        let public_key = keys::load_public_key(&config.public_key)?;
        let private_key = keys::load_private_key(&config.private_key)?;
        debug!(
            modulus_bits = public_key.size() * 8,
            signing_secret = config.signing_secret.is_some(),
            "asymmetric driver ready"
        );
        Ok(Self {
            signing_key: SigningKey::new(private_key.clone()),
            verifying_key: VerifyingKey::new(public_key.clone()),
            public_key,
            private_key,
            signing_secret: config.signing_secret,
        })
    }

    /// Encrypt with the public key; returns base64 ciphertext.
    ///
    /// Plaintext must be shorter than the modulus minus 11 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Rsa`] if the primitive fails (e.g. oversized input).
    pub fn encrypt_base64(&self, plaintext: &[u8]) -> Result<String, CryptError> {
        let ciphertext = self
            .public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| CryptError::Rsa(e.to_string()))?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt base64 ciphertext with the private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Rsa`] if the input is not base64 or the primitive fails.
    pub fn decrypt_base64(&self, ciphertext: &str) -> Result<Vec<u8>, CryptError> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CryptError::Rsa(format!("ciphertext is not base64: {e}")))?;
        self.private_key
            .decrypt(Pkcs1v15Encrypt, &raw)
            .map_err(|e| CryptError::Rsa(e.to_string()))
    }

    /// Keyed-MD5 signature of `params`.
    pub fn generate_sign(&self, params: &SignParams) -> String {
        md5_upper(&params.content_with_secret(self.signing_secret.as_deref()))
    }

    /// Check a keyed-MD5 signature.
    ///
    /// The expected value is `sign`, or the `sign` entry of `params` when
    /// `sign` is `None`. The comparison is plain string equality.
    pub fn verify_sign(&self, params: &SignParams, sign: Option<&str>) -> bool {
        match sign.or_else(|| params.get(SIGN_FIELD)) {
            Some(expected) => expected == self.generate_sign(params),
            None => false,
        }
    }

    /// RSA/SHA-256 signature of `params`, base64 encoded.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Rsa`] if the signing primitive fails.
    pub fn generate_rsa_sign(&self, params: &SignParams) -> Result<String, CryptError> {
        let message = md5_upper(&params.canonical_content());
        let signature = self
            .signing_key
            .try_sign(message.as_bytes())
            .map_err(|e| CryptError::Rsa(e.to_string()))?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }

    /// Verify an RSA/SHA-256 signature of `params`.
    ///
    /// Expected-value resolution is the same as [`RsaDriver::verify_sign`].
    /// Malformed base64 or signature bytes count as a failed verification.
    pub fn verify_rsa_sign(&self, params: &SignParams, sign: Option<&str>) -> bool {
        let Some(encoded) = sign.or_else(|| params.get(SIGN_FIELD)) else {
            return false;
        };
        let Ok(raw) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else {
            return false;
        };
        let message = md5_upper(&params.canonical_content());
        self.verifying_key
            .verify(message.as_bytes(), &signature)
            .is_ok()
    }

    /// The loaded public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

impl fmt::Debug for RsaDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaDriver")
            .field("modulus_bits", &(self.public_key.size() * 8))
            .field("private_key", &"[REDACTED]")
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CryptoDriver for RsaDriver {
    fn name(&self) -> &'static str {
        "rsa"
    }

    /// The returned bytes are base64 ASCII.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptError> {
        self.encrypt_base64(plaintext).map(String::into_bytes)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptError> {
        let text = std::str::from_utf8(ciphertext)
            .map_err(|_| CryptError::Rsa("ciphertext is not base64".into()))?;
        self.decrypt_base64(text)
    }
}
