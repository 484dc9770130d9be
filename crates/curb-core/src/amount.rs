//! Fixed-point amount type for crypto and cash legs.
//!
//! The [`Amount`] type carries 8 decimal places of precision, enough for
//! the Lightning leg (satoshi granularity) while also representing cash
//! and stablecoin values exactly. All arithmetic is overflow-checked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ValidationError;

/// Number of decimal places carried by an [`Amount`].
pub const DECIMALS: u32 = 8;

/// Base units per whole unit (10^8).
pub const UNITS_PER_WHOLE: u64 = 100_000_000;

/// A monetary quantity with fixed-point precision (8 decimals).
///
/// Internally stored as base units (10^-8) to avoid floating-point drift
/// in trade terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an Amount from base units.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Creates an Amount from whole units.
    ///
    /// Saturates at [`Amount::MAX`] if the value does not fit.
    #[must_use]
    pub const fn from_whole(whole: u64) -> Self {
        match whole.checked_mul(UNITS_PER_WHOLE) {
            Some(v) => Self(v),
            None => Self::MAX,
        }
    }

    /// Returns the amount in base units.
    #[must_use]
    pub const fn as_units(self) -> u64 {
        self.0
    }

    /// Returns the whole-unit part (truncates the fraction).
    #[must_use]
    pub const fn as_whole(self) -> u64 {
        self.0 / UNITS_PER_WHOLE
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Renders the amount with exactly `decimals` fractional digits
    /// (truncating, not rounding).
    #[must_use]
    pub fn to_decimal_string(self, decimals: u32) -> String {
        let decimals = decimals.min(DECIMALS);
        let whole = self.0 / UNITS_PER_WHOLE;
        if decimals == 0 {
            return whole.to_string();
        }
        let frac = self.0 % UNITS_PER_WHOLE;
        let scale = 10u64.pow(DECIMALS - decimals);
        format!(
            "{whole}.{frac:0width$}",
            frac = frac / scale,
            width = decimals as usize
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_WHOLE;
        let frac = self.0 % UNITS_PER_WHOLE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:08}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAmount(s.to_string());

        let (whole_part, frac_part) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole_part.is_empty()
            || !whole_part.bytes().all(|b| b.is_ascii_digit())
            || frac_part.len() > DECIMALS as usize
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = whole_part.parse().map_err(|_| invalid())?;
        let frac = if frac_part.is_empty() {
            0
        } else {
            let padded: u64 = frac_part.parse().map_err(|_| invalid())?;
            padded * 10u64.pow(DECIMALS - frac_part.len() as u32)
        };

        whole
            .checked_mul(UNITS_PER_WHOLE)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
