//! Mapping of CLI operations onto driver calls.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use paycrypt::{Crypt, CryptoDriver, SignParams};
use tracing::{info, warn};

/// An operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
    EncryptMac,
    DecryptMac,
    Sign,
    Verify,
    RsaSign,
    RsaVerify,
}

impl Operation {
    const ALL: [Operation; 8] = [
        Operation::Encrypt,
        Operation::Decrypt,
        Operation::EncryptMac,
        Operation::DecryptMac,
        Operation::Sign,
        Operation::Verify,
        Operation::RsaSign,
        Operation::RsaVerify,
    ];

    /// Command-line spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
            Operation::EncryptMac => "encrypt-mac",
            Operation::DecryptMac => "decrypt-mac",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
            Operation::RsaSign => "rsa-sign",
            Operation::RsaVerify => "rsa-verify",
        }
    }

    /// Usage line listing every operation.
    pub fn usage() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|op| op.as_str()).collect();
        format!("usage: paycrypt <{}>  (input on stdin)", names.join("|"))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown operation `{s}`; {}", Self::usage()))
    }
}

/// Result of running an [`Operation`].
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes to write to stdout.
    Output(Vec<u8>),
    /// Result of a signature check.
    Verified(bool),
}

/// Run `op` on `input` with the driver named `driver`.
///
/// Signing operations expect `input` to be a JSON object of request
/// parameters; verification reads the expected signature from its `sign` field.
pub fn run(crypt: &Crypt, driver: &str, op: Operation, input: &[u8]) -> Result<Outcome> {
    info!(driver, operation = %op, input_len = input.len(), "running operation");
    let outcome = match op {
        Operation::Encrypt => Outcome::Output(crypt.create(driver)?.encrypt(input)?),
        Operation::Decrypt => Outcome::Output(crypt.create(driver)?.decrypt(input)?),
        Operation::EncryptMac => {
            let aes = crypt.create_aes(driver)?;
            Outcome::Output(aes.encrypt_with_mac(input)?.into_bytes())
        }
        Operation::DecryptMac => {
            let aes = crypt.create_aes(driver)?;
            let payload = std::str::from_utf8(input).context("payload is not UTF-8")?;
            Outcome::Output(aes.decrypt_with_mac(payload)?)
        }
        Operation::Sign => {
            let rsa = crypt.create_rsa(driver)?;
            Outcome::Output(rsa.generate_sign(&parse_params(input)?).into_bytes())
        }
        Operation::Verify => {
            let rsa = crypt.create_rsa(driver)?;
            Outcome::Verified(rsa.verify_sign(&parse_params(input)?, None))
        }
        Operation::RsaSign => {
            let rsa = crypt.create_rsa(driver)?;
            Outcome::Output(rsa.generate_rsa_sign(&parse_params(input)?)?.into_bytes())
        }
        Operation::RsaVerify => {
            let rsa = crypt.create_rsa(driver)?;
            Outcome::Verified(rsa.verify_rsa_sign(&parse_params(input)?, None))
        }
    };
    if outcome == Outcome::Verified(false) {
        warn!(operation = %op, "signature verification failed");
    }
    Ok(outcome)
}

fn parse_params(input: &[u8]) -> Result<SignParams> {
    let value: serde_json::Value =
        serde_json::from_slice(input).context("signing input must be a JSON object")?;
    SignParams::from_json(&value).context("signing input must be a JSON object")
}
