//! Canonical request parameters and the keyed-MD5 signature string.
//!
//! # Canonical content
//!
//! ```text
//! k1=v1&k2=v2&...      keys sorted byte-wise, `sign` and empty values dropped
//! ```
//!
//! With a signing secret, `&key=<secret>` is appended before hashing.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use paycrypt_common::CryptError;
use serde_json::{Number, Value};

/// Name of the parameter that carries the signature itself.
pub const SIGN_FIELD: &str = "sign";

/// Request parameters to be signed, ordered by key.
///
/// `None` and empty values are kept in the map (so `sign` lookups and
/// round-trips work) but never contribute to the canonical content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignParams(BTreeMap<String, Option<String>>);

impl SignParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a present value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    /// Insert a value that may be absent.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<String>) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Look up a present value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Build parameters from a JSON object.
    ///
    /// Strings are taken as-is, numbers use their JSON text except that integral
    /// floats drop the fraction (`1.0` becomes `"1"`), `true` becomes
    /// `"1"`, `false` and `null` are absent, and nested arrays or objects are
    /// kept as compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::InvalidPayload`] if `value` is not a JSON object.
    pub fn from_json(value: &Value) -> Result<Self, CryptError> {
        let object = value.as_object().ok_or(CryptError::InvalidPayload)?;
        let params = object
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::Null | Value::Bool(false) => None,
                    Value::Bool(true) => Some("1".to_owned()),
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(number_text(n)),
                    nested => Some(nested.to_string()),
                };
                (k.clone(), v)
            })
            .collect();
        Ok(Self(params))
    }

    /// Join the signable entries as `k=v&...`.
    pub fn canonical_content(&self) -> String {
        let joined = self
            .0
            .iter()
            .filter(|(k, _)| k.as_str() != SIGN_FIELD)
            .filter_map(|(k, v)| {
                v.as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{k}={v}"))
            })
            .collect::<Vec<_>>()
            .join("&");
        joined.trim_matches('&').to_owned()
    }

    /// Canonical content plus the optional `&key=<secret>` suffix.
    pub fn content_with_secret(&self, secret: Option<&str>) -> String {
        let content = self.canonical_content();
        match secret {
            Some(secret) => format!("{content}&key={secret}"),
            None => content,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SignParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// Text of a JSON number, with integral floats rendered as integers.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Uppercase hex MD5 of `content`.
pub(crate) fn md5_upper(content: &str) -> String {
    hex::encode_upper(Md5::digest(content.as_bytes()))
}
