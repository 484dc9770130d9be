//! Error types for curb-core.

use thiserror::Error;

/// Errors raised while validating user-supplied terms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An amount that must be strictly positive was zero.
    #[error("{field} must be greater than zero")]
    NonPositiveAmount {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An amount string could not be parsed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A wallet address had the wrong shape.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// A currency code was not three uppercase ASCII letters.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Pickup listings must name a meeting location.
    #[error("location is required for pickup settlement")]
    MissingLocation,

    /// A free-text field exceeded its length cap.
    #[error("{field} exceeds {max} characters")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },
}
