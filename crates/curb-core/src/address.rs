//! Validated wallet address type.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Regex for valid wallet addresses (0x-prefixed, 40 hex chars).
static ADDRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap_or_else(|_| unreachable!()));

/// An opaque, already-verified wallet identity.
///
/// The wallet provider authenticates callers; this type only enforces the
/// lexical shape and normalizes casing so addresses compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses and normalizes a wallet address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] if the input is not a
    /// 0x-prefixed 40-hex-char string.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if ADDRESS_REGEX.is_match(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(ValidationError::InvalidAddress(raw.to_string()))
        }
    }

    /// Returns the full lowercase form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display: first 6 and last 4 characters.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELLER: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn address_accepts_well_formed() {
        let addr = Address::new(SELLER).expect("valid");
        assert_eq!(addr.as_str(), SELLER);
    }

    #[test]
    fn address_normalizes_case() {
        let upper = SELLER.to_ascii_uppercase().replace("0X", "0x");
        let a = Address::new(SELLER).expect("valid");
        let b = Address::new(&upper).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn address_rejects_malformed() {
        assert!(Address::new("").is_err());
        assert!(Address::new("0x1234").is_err());
        assert!(Address::new("1234567890abcdef1234567890abcdef12345678").is_err());
        assert!(Address::new("0xzzzz567890abcdef1234567890abcdef12345678").is_err());
    }

    #[test]
    fn address_short_form() {
        let addr = Address::new(SELLER).expect("valid");
        assert_eq!(addr.short(), "0x1234...5678");
    }

    #[test]
    fn address_serde_round_trip() {
        let addr = Address::new(SELLER).expect("valid");
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"{SELLER}\""));

        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(addr, back);

        let bad: Result<Address, _> = serde_json::from_str("\"0xnope\"");
        assert!(bad.is_err());
    }
}
