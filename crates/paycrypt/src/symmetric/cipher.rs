//! AES-CBC cipher selection and the raw block-cipher calls.

use std::fmt;
use std::str::FromStr;

use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use paycrypt_common::CryptError;

/// AES block size in bytes. Also the IV length of every supported cipher.
pub const BLOCK_SIZE: usize = 16;

/// Supported block ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cipher {
    /// AES-128 in CBC mode; 16-byte key.
    #[default]
    Aes128Cbc,
    /// AES-256 in CBC mode; 32-byte key.
    Aes256Cbc,
}

impl Cipher {
    /// Required key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Cipher::Aes128Cbc => 16,
            Cipher::Aes256Cbc => 32,
        }
    }

    /// Required IV length in bytes.
    pub const fn iv_len(self) -> usize {
        BLOCK_SIZE
    }

    /// Canonical OpenSSL-style name, e.g. `AES-128-CBC`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Cipher::Aes128Cbc => "AES-128-CBC",
            Cipher::Aes256Cbc => "AES-256-CBC",
        }
    }

    /// Encrypt `plaintext` in CBC mode, appending PKCS#7 padding.
    pub(crate) fn encrypt(self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptError> {
        let encrypted = match self {
            Cipher::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
                .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            Cipher::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
                .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        };
        encrypted.map_err(|_| CryptError::UnsupportedCipher)
    }

    /// Decrypt `ciphertext` in CBC mode and strip the PKCS#7 padding.
    pub(crate) fn decrypt(self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptError> {
        let decrypted = match self {
            Cipher::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
                .map_err(|_| CryptError::UnsupportedCipher)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Cipher::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
                .map_err(|_| CryptError::UnsupportedCipher)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        decrypted.map_err(|_| CryptError::Decryption("bad block length or padding".into()))
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts exactly `AES-128-CBC` or `AES-256-CBC`.
impl FromStr for Cipher {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AES-128-CBC" => Ok(Cipher::Aes128Cbc),
            "AES-256-CBC" => Ok(Cipher::Aes256Cbc),
            _ => Err(CryptError::UnsupportedCipher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("AES-128-CBC".parse::<Cipher>().unwrap(), Cipher::Aes128Cbc);
        assert_eq!("AES-256-CBC".parse::<Cipher>().unwrap(), Cipher::Aes256Cbc);
        assert!("aes-256-cbc".parse::<Cipher>().is_err());
        assert!(" AES-128-CBC".parse::<Cipher>().is_err());
        assert!("AES-192-CBC".parse::<Cipher>().is_err());
        assert!("AES-256-GCM".parse::<Cipher>().is_err());
    }

    #[test]
    fn lengths() {
        assert_eq!(Cipher::Aes128Cbc.key_len(), 16);
        assert_eq!(Cipher::Aes256Cbc.key_len(), 32);
        assert_eq!(Cipher::Aes128Cbc.iv_len(), 16);
        assert_eq!(Cipher::Aes256Cbc.iv_len(), 16);
    }

    #[test]
    fn cbc_round_trip() {
        let key = [7u8; 32];
        let iv = [9u8; 16];
        let ct = Cipher::Aes256Cbc.encrypt(&key, &iv, b"sixteen byte msg").unwrap();
        // A full padding block is added to aligned input.
        assert_eq!(ct.len(), 32);
        let pt = Cipher::Aes256Cbc.decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt, b"sixteen byte msg");
    }

    #[test]
    fn truncated_ciphertext_is_a_decryption_error() {
        let key = [1u8; 16];
        let iv = [2u8; 16];
        let ct = Cipher::Aes128Cbc.encrypt(&key, &iv, b"hello").unwrap();
        let err = Cipher::Aes128Cbc.decrypt(&key, &iv, &ct[..10]).unwrap_err();
        assert!(matches!(err, CryptError::Decryption(_)));
    }

    #[test]
    fn wrong_key_length_is_unsupported() {
        let err = Cipher::Aes128Cbc.encrypt(&[0u8; 15], &[0u8; 16], b"x").unwrap_err();
        assert!(matches!(err, CryptError::UnsupportedCipher));
    }
}
