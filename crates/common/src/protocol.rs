//! Wire formats exchanged with other producers and consumers of ciphertext.
//!
//! The [`Envelope`] is the MAC-protected symmetric payload. On the wire it is
//! `base64(JSON)` with the fields in the order `iv`, `value`, `mac`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::CryptError;

/// A MAC-protected symmetric payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 of the raw IV bytes.
    pub iv: String,
    /// Base64 of the raw ciphertext bytes.
    pub value: String,
    /// Lowercase hex HMAC-SHA256 over `iv || value`.
    pub mac: String,
}

impl Envelope {
    /// Encode this envelope to its `base64(JSON)` wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::InvalidPayload`] if JSON serialisation fails.
    pub fn to_payload(&self) -> Result<String, CryptError> {
        let json = serde_json::to_vec(self).map_err(|_| CryptError::InvalidPayload)?;
        Ok(STANDARD.encode(json))
    }

    /// Parse a `base64(JSON)` payload back into an [`Envelope`].
    ///
    /// Only the shape is checked here; IV length and MAC are the driver's job.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::InvalidPayload`] if the payload is not base64, not
    /// a JSON object, or lacks one of the string fields `iv`, `value`, `mac`.
    pub fn from_payload(payload: &str) -> Result<Self, CryptError> {
        let json = STANDARD
            .decode(payload.trim())
            .map_err(|_| CryptError::InvalidPayload)?;
        serde_json::from_slice(&json).map_err(|_| CryptError::InvalidPayload)
    }
}
