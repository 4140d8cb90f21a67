//! AES-CBC driver with two modes of operation.
//!
//! # Legacy mode (`CryptoDriver::encrypt` / `CryptoDriver::decrypt`)
//!
//! ```text
//! hex( AES-CBC-PKCS7( key, iv = key[..16], PKCS7( base64(plaintext) ) ) )
//! ```
//!
//! The IV is derived from the key, so the same key and plaintext always produce
//! the same ciphertext. **This scheme has no semantic security** across repeated
//! encryptions; it exists only so that ciphertext written by existing deployments
//! stays readable. Prefer the envelope mode for anything new.
//!
//! Note the two padding layers: the encoded plaintext is padded explicitly, and
//! the block cipher pads again on top. Decryption also accepts ciphertext that
//! carries only the cipher's layer.
//!
//! # Envelope mode (`encrypt_with_mac` / `decrypt_with_mac`)
//!
//! Random IV, `value = base64(AES-CBC-PKCS7(plaintext))`,
//! `mac = hex(HMAC-SHA256(key, base64(iv) || value))`, serialised as an
//! [`Envelope`].

mod cipher;
mod padding;

pub use cipher::{Cipher, BLOCK_SIZE};

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use paycrypt_common::{CryptError, Envelope};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::driver::CryptoDriver;

type HmacSha256 = Hmac<Sha256>;

/// Length of the key-derived IV used by legacy mode.
const LEGACY_IV_LEN: usize = 16;

/// Key material and cipher for an [`AesDriver`].
#[derive(Clone)]
pub struct SymmetricKeyConfig {
    /// Raw key bytes; length must match [`Cipher::key_len`].
    pub key: Vec<u8>,
    /// Block cipher to use.
    pub cipher: Cipher,
}

impl SymmetricKeyConfig {
    /// Build a config from key bytes and a cipher.
    pub fn new(key: impl Into<Vec<u8>>, cipher: Cipher) -> Self {
        Self {
            key: key.into(),
            cipher,
        }
    }
}

impl fmt::Debug for SymmetricKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKeyConfig")
            .field("key", &"[REDACTED]")
            .field("cipher", &self.cipher)
            .finish()
    }
}

/// AES-CBC driver. Immutable once built; safe to share across threads.
pub struct AesDriver {
    key: Zeroizing<Vec<u8>>,
    cipher: Cipher,
}

impl AesDriver {
    /// Build a driver, validating the key/cipher pairing.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::UnsupportedCipher`] if the key length does not
    /// match the cipher.
    pub fn new(config: SymmetricKeyConfig) -> Result<Self, CryptError> {
        let SymmetricKeyConfig { key, cipher } = config;
        let key = Zeroizing::new(key);
        if !Self::supported(&key, cipher) {
            return Err(CryptError::UnsupportedCipher);
        }
        debug!(cipher = %cipher, "symmetric driver ready");
        Ok(Self { key, cipher })
    }

    /// Whether `key` has the right length for `cipher`.
    pub fn supported(key: &[u8], cipher: Cipher) -> bool {
        key.len() == cipher.key_len()
    }

    /// The configured cipher.
    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Legacy mode: encrypt to a lowercase hex string.
    ///
    /// Deterministic for a given key and plaintext (see the module docs).
    pub fn encrypt_hex(&self, plaintext: &[u8]) -> Result<String, CryptError> {
        let encoded = STANDARD.encode(plaintext);
        let padded = padding::pad(encoded.as_bytes(), BLOCK_SIZE);
        let ciphertext = self.cipher.encrypt(&self.key, self.legacy_iv(), &padded)?;
        Ok(hex::encode(ciphertext))
    }

    /// Legacy mode: decrypt a hex string produced by [`AesDriver::encrypt_hex`].
    ///
    /// The inner PKCS#7 layer is stripped when present, so ciphertext from
    /// producers that pad only once is accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Decryption`] if the input is not hexadecimal, or if
    /// decryption or base64 decoding fails.
    pub fn decrypt_hex(&self, ciphertext: &str) -> Result<Vec<u8>, CryptError> {
        if ciphertext.is_empty() || !ciphertext.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptError::Decryption("ciphertext is not hexadecimal".into()));
        }
        let raw = hex::decode(ciphertext)
            .map_err(|e| CryptError::Decryption(format!("ciphertext is not hexadecimal: {e}")))?;

        let padded = Zeroizing::new(self.cipher.decrypt(&self.key, self.legacy_iv(), &raw)?);
        // Producers that rely on the cipher's padding alone leave no inner layer.
        let encoded = padding::unpad(&padded, BLOCK_SIZE).unwrap_or(&padded[..]);
        STANDARD
            .decode(encoded)
            .map_err(|e| CryptError::Decryption(format!("plaintext is not base64: {e}")))
    }

    /// Envelope mode: encrypt under a fresh random IV and MAC the result.
    ///
    /// Returns the `base64(JSON)` payload.
    pub fn encrypt_with_mac(&self, plaintext: &[u8]) -> Result<String, CryptError> {
        let mut iv = vec![0u8; self.cipher.iv_len()];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = self.cipher.encrypt(&self.key, &iv, plaintext)?;
        let iv = STANDARD.encode(&iv);
        let value = STANDARD.encode(ciphertext);
        let mac = self.hash(&iv, &value)?;

        Envelope { iv, value, mac }.to_payload()
    }

    /// Envelope mode: verify and decrypt a payload from [`AesDriver::encrypt_with_mac`].
    ///
    /// # Errors
    ///
    /// - [`CryptError::InvalidPayload`] if the payload is malformed or the IV has
    ///   the wrong length.
    /// - [`CryptError::InvalidMac`] if the MAC does not match.
    /// - [`CryptError::Decryption`] if the verified ciphertext cannot be decrypted.
    pub fn decrypt_with_mac(&self, payload: &str) -> Result<Vec<u8>, CryptError> {
        let envelope = Envelope::from_payload(payload).map_err(|e| {
            warn!("rejected malformed envelope");
            e
        })?;

        let iv = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| CryptError::InvalidPayload)?;
        if iv.len() != self.cipher.iv_len() {
            warn!(iv_len = iv.len(), "rejected envelope with bad IV length");
            return Err(CryptError::InvalidPayload);
        }

        if !self.valid_mac(&envelope)? {
            warn!("envelope MAC mismatch");
            return Err(CryptError::InvalidMac);
        }

        let ciphertext = STANDARD
            .decode(&envelope.value)
            .map_err(|e| CryptError::Decryption(format!("value is not base64: {e}")))?;
        self.cipher.decrypt(&self.key, &iv, &ciphertext)
    }

    fn legacy_iv(&self) -> &[u8] {
        &self.key[..LEGACY_IV_LEN]
    }

    /// Hex HMAC-SHA256 over the concatenated base64 IV and value.
    fn hash(&self, iv: &str, value: &str) -> Result<String, CryptError> {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(&self.key).map_err(|_| CryptError::UnsupportedCipher)?;
        mac.update(iv.as_bytes());
        mac.update(value.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn valid_mac(&self, envelope: &Envelope) -> Result<bool, CryptError> {
        let expected = self.hash(&envelope.iv, &envelope.value)?;
        Ok(expected.as_bytes().ct_eq(envelope.mac.as_bytes()).into())
    }
}

impl fmt::Debug for AesDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesDriver")
            .field("key", &"[REDACTED]")
            .field("cipher", &self.cipher)
            .finish()
    }
}

impl CryptoDriver for AesDriver {
    fn name(&self) -> &'static str {
        "aes"
    }

    /// Legacy mode; the returned bytes are lowercase ASCII hex.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptError> {
        self.encrypt_hex(plaintext).map(String::into_bytes)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptError> {
        let text = std::str::from_utf8(ciphertext)
            .map_err(|_| CryptError::Decryption("ciphertext is not hexadecimal".into()))?;
        self.decrypt_hex(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_128: &str = "0123456789abcdef";
    const KEY_256: &str = "0123456789abcdef0123456789abcdef";

    fn aes128() -> AesDriver {
        AesDriver::new(SymmetricKeyConfig::new(KEY_128, Cipher::Aes128Cbc)).unwrap()
    }

    fn aes256() -> AesDriver {
        AesDriver::new(SymmetricKeyConfig::new(KEY_256, Cipher::Aes256Cbc)).unwrap()
    }

    fn tamper(payload: &str, f: impl FnOnce(&mut Envelope)) -> String {
        let mut env = Envelope::from_payload(payload).unwrap();
        f(&mut env);
        env.to_payload().unwrap()
    }

    #[test]
    fn rejects_short_key() {
        let err = AesDriver::new(SymmetricKeyConfig::new(vec![0u8; 15], Cipher::Aes128Cbc)).unwrap_err();
        assert!(matches!(err, CryptError::UnsupportedCipher));
    }

    #[test]
    fn rejects_mismatched_pairing() {
        assert!(AesDriver::new(SymmetricKeyConfig::new(KEY_256, Cipher::Aes128Cbc)).is_err());
        assert!(AesDriver::new(SymmetricKeyConfig::new(KEY_128, Cipher::Aes256Cbc)).is_err());
    }

    #[test]
    fn legacy_known_answer_aes128() {
        assert_eq!(
            aes128().encrypt_hex(b"hello").unwrap(),
            "7410a2a9e96a28f1343c7b48ce1aa4408686876943e726f66e27743ce2957a89"
        );
    }

    #[test]
    fn legacy_known_answer_aes256() {
        assert_eq!(
            aes256().encrypt_hex(b"hello").unwrap(),
            "e987a2a989302b0345a2b0f1f99ced2c5cc0970559ca38a6cabc8d6e36b46adf"
        );
    }

    #[test]
    fn legacy_round_trip() {
        for driver in [aes128(), aes256()] {
            let plaintexts: [&[u8]; 5] = [b"", b"a", b"exactly 16 bytes", "订单号 42".as_bytes(), &[0, 255, 1, 254]];
            for plaintext in plaintexts {
                let hex = driver.encrypt_hex(plaintext).unwrap();
                assert_eq!(driver.decrypt_hex(&hex).unwrap(), plaintext);
            }
        }
    }

    #[test]
    fn legacy_is_deterministic_and_lowercase() {
        let driver = aes128();
        let a = driver.encrypt_hex(b"same input").unwrap();
        let b = driver.encrypt_hex(b"same input").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, a.to_ascii_lowercase());
    }

    #[test]
    fn legacy_decrypt_accepts_uppercase_hex() {
        let driver = aes128();
        let hex = driver.encrypt_hex(b"mixed case").unwrap().to_ascii_uppercase();
        assert_eq!(driver.decrypt_hex(&hex).unwrap(), b"mixed case");
    }

    #[test]
    fn legacy_decrypt_rejects_non_hex() {
        let driver = aes128();
        for input in ["", "not hex at all", "zz00", "7410a2a9 e96a"] {
            let err = driver.decrypt_hex(input).unwrap_err();
            assert!(matches!(err, CryptError::Decryption(_)), "{input:?}");
        }
    }

    #[test]
    fn legacy_decrypt_rejects_garbage_hex() {
        let driver = aes128();
        assert!(driver.decrypt_hex("abc").is_err());
        assert!(driver.decrypt_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn legacy_decrypt_accepts_single_padding() {
        // `openssl enc -aes-128-cbc` over "aGVsbG8=" with key and IV "0123456789abcdef".
        let plain = aes128().decrypt_hex("7410a2a9e96a28f1343c7b48ce1aa440").unwrap();
        assert_eq!(plain, b"hello");
    }

    #[test]
    fn legacy_wrong_key_does_not_yield_plaintext() {
        let hex = aes128().encrypt_hex(b"hello").unwrap();
        let other = AesDriver::new(SymmetricKeyConfig::new("fedcba9876543210", Cipher::Aes128Cbc)).unwrap();
        assert_ne!(other.decrypt_hex(&hex).ok().as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn envelope_round_trip() {
        for driver in [aes128(), aes256()] {
            let payload = driver.encrypt_with_mac(b"card=4111111111111111").unwrap();
            assert_eq!(driver.decrypt_with_mac(&payload).unwrap(), b"card=4111111111111111");
        }
    }

    #[test]
    fn envelope_uses_random_iv() {
        let driver = aes128();
        let a = driver.encrypt_with_mac(b"x").unwrap();
        let b = driver.encrypt_with_mac(b"x").unwrap();
        assert_ne!(a, b);
        let env = Envelope::from_payload(&a).unwrap();
        assert_eq!(STANDARD.decode(env.iv).unwrap().len(), 16);
        assert_eq!(env.mac.len(), 64);
    }

    #[test]
    fn envelope_from_external_producer() {
        // iv = 00..0f, plaintext "secret message", key KEY_128.
        let payload = "eyJpdiI6IkFBRUNBd1FGQmdjSUNRb0xEQTBPRHc9PSIsInZhbHVlIjoiNHZwWkxjVXdObWF3VURvaGJDcFZKZz09IiwibWFjIjoiNmY2ZWJkMjc4N2EwYTcwZTFlZTM1NmZjMzcwMzFmYTllMmIxOTExYTczYjUzN2U5MzBhN2JlZmJiNTJkMTEzMSJ9";
        assert_eq!(aes128().decrypt_with_mac(payload).unwrap(), b"secret message");
    }

    #[test]
    fn envelope_accepts_escaped_slashes() {
        let driver = aes128();
        let payload = driver.encrypt_with_mac(b"slashes").unwrap();
        let json = String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap();
        let escaped = STANDARD.encode(json.replace('/', "\\/"));
        assert_eq!(driver.decrypt_with_mac(&escaped).unwrap(), b"slashes");
    }

    #[test]
    fn flipped_mac_is_rejected() {
        let driver = aes128();
        let payload = driver.encrypt_with_mac(b"amount=100").unwrap();
        let tampered = tamper(&payload, |env| {
            let first = if env.mac.starts_with('0') { "1" } else { "0" };
            env.mac.replace_range(0..1, first);
        });
        assert!(matches!(driver.decrypt_with_mac(&tampered), Err(CryptError::InvalidMac)));
    }

    #[test]
    fn tampered_value_is_rejected() {
        let driver = aes128();
        let payload = driver.encrypt_with_mac(b"amount=100").unwrap();
        let other = driver.encrypt_with_mac(b"amount=999").unwrap();
        let other_value = Envelope::from_payload(&other).unwrap().value;
        let tampered = tamper(&payload, |env| env.value = other_value);
        assert!(matches!(driver.decrypt_with_mac(&tampered), Err(CryptError::InvalidMac)));
    }

    #[test]
    fn mac_from_other_key_is_rejected() {
        let payload = aes128().encrypt_with_mac(b"x").unwrap();
        let other = AesDriver::new(SymmetricKeyConfig::new("fedcba9876543210", Cipher::Aes128Cbc)).unwrap();
        assert!(matches!(other.decrypt_with_mac(&payload), Err(CryptError::InvalidMac)));
    }

    #[test]
    fn bad_iv_length_is_invalid_payload() {
        let driver = aes128();
        let payload = driver.encrypt_with_mac(b"x").unwrap();
        let tampered = tamper(&payload, |env| env.iv = STANDARD.encode([0u8; 8]));
        assert!(matches!(driver.decrypt_with_mac(&tampered), Err(CryptError::InvalidPayload)));
    }

    #[test]
    fn garbage_payload_is_invalid_payload() {
        let driver = aes128();
        assert!(matches!(driver.decrypt_with_mac("%%%"), Err(CryptError::InvalidPayload)));
        let not_object = STANDARD.encode("\"just a string\"");
        assert!(matches!(driver.decrypt_with_mac(&not_object), Err(CryptError::InvalidPayload)));
    }

    #[test]
    fn debug_redacts_key() {
        let out = format!("{:?}", aes128());
        assert!(out.contains("REDACTED"));
        assert!(!out.contains(KEY_128));
    }

    #[test]
    fn trait_methods_use_legacy_mode() {
        let driver = aes128();
        let ct = CryptoDriver::encrypt(&driver, b"hello").unwrap();
        assert_eq!(ct, driver.encrypt_hex(b"hello").unwrap().into_bytes());
        assert_eq!(CryptoDriver::decrypt(&driver, &ct).unwrap(), b"hello");
        assert_eq!(driver.name(), "aes");
    }
}
