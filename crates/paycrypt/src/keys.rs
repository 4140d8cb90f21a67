//! RSA key material loading.
//!
//! A key input is either a path to a PEM file (recognised by its extension) or
//! the bare base64 body of a PEM block, as commonly pasted from a payment
//! provider's console. Bare bodies are wrapped in the matching
//! `BEGIN`/`END` lines, 64 characters per line, before parsing.

use std::fs;
use std::path::Path;

use paycrypt_common::CryptError;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

/// File extensions treated as paths to PEM files.
pub const KEY_FILE_EXTENSIONS: &[&str] = &["pem"];

/// Line width of the base64 body in a PEM block.
pub const PEM_LINE_WIDTH: usize = 64;

const PUBLIC_LABEL: &str = "PUBLIC KEY";
const PRIVATE_LABEL: &str = "PRIVATE KEY";

/// Load an RSA public key from a PEM file path or a bare base64 body.
///
/// Whitespace around `input` is ignored, as is whitespace inside a bare body.
///
/// PEM files may hold either an SPKI (`PUBLIC KEY`) or a PKCS#1
/// (`RSA PUBLIC KEY`) block.
///
/// # Errors
///
/// Returns [`CryptError::KeyFormat`] if the file cannot be read or the result
/// is not a parseable RSA public key.
pub fn load_public_key(input: &str) -> Result<RsaPublicKey, CryptError> {
    let pem = resolve_pem(input, PUBLIC_LABEL)?;
    let key = RsaPublicKey::from_public_key_pem(&pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
        .map_err(|e| CryptError::KeyFormat(format!("not a valid RSA public key: {e}")))?;
    debug!(source = source_kind(input), bits = key.size() * 8, "loaded public key");
    Ok(key)
}

/// Load an RSA private key from a PEM file path or a bare base64 body.
///
/// PEM files may hold either a PKCS#8 (`PRIVATE KEY`) or a PKCS#1
/// (`RSA PRIVATE KEY`) block. Encrypted keys are not supported.
///
/// # Errors
///
/// Returns [`CryptError::KeyFormat`] if the file cannot be read or the result
/// is not a parseable, consistent RSA private key.
pub fn load_private_key(input: &str) -> Result<RsaPrivateKey, CryptError> {
    let pem = resolve_pem(input, PRIVATE_LABEL)?;
    let key = RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
        .map_err(|e| CryptError::KeyFormat(format!("not a valid RSA private key: {e}")))?;
    key.validate()
        .map_err(|e| CryptError::KeyFormat(format!("inconsistent RSA private key: {e}")))?;
    debug!(source = source_kind(input), bits = key.size() * 8, "loaded private key");
    Ok(key)
}

/// Wrap a bare base64 key body in a PEM block with the given label.
pub fn wrap_pem(body: &str, label: &str) -> String {
    let body: Vec<char> = body.chars().filter(|c| !c.is_whitespace()).collect();
    let lines = body
        .chunks(PEM_LINE_WIDTH)
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    format!("-----BEGIN {label}-----\n{lines}\n-----END {label}-----")
}

/// Whether `input` names a key file rather than carrying a key body.
///
/// The extension must match exactly: `KEY.PEM` is treated as a key body.
pub fn is_key_file(input: &str) -> bool {
    Path::new(input)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| KEY_FILE_EXTENSIONS.contains(&ext))
}

fn resolve_pem(input: &str, label: &str) -> Result<String, CryptError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CryptError::KeyFormat(format!("{} is empty", label.to_lowercase())));
    }
    if is_key_file(input) {
        fs::read_to_string(input)
            .map_err(|e| CryptError::KeyFormat(format!("cannot read key file {input}: {e}")))
    } else {
        Ok(wrap_pem(input, label))
    }
}

fn source_kind(input: &str) -> &'static str {
    if is_key_file(input.trim()) {
        "file"
    } else {
        "inline"
    }
}
