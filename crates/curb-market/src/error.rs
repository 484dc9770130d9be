//! Error types for curb-market.

use curb_core::ValidationError;
use thiserror::Error;

use crate::custody::CustodyError;

/// Result type alias for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
#[derive(Debug, Error)]
pub enum MarketError {
    /// User-supplied terms failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An entity id did not resolve.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind ("listing", "transaction", "escrow", "profile").
        kind: &'static str,
        /// The id that missed.
        id: String,
    },

    /// The requested transition is not legal from the current state.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// The caller is not the party allowed to trigger this operation.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// Operation that was attempted.
        action: &'static str,
        /// The rejected caller.
        caller: String,
    },

    /// The listing creator tried to trade against their own listing.
    #[error("cannot open a trade against your own listing")]
    SelfTrade,

    /// The listing has been retired.
    #[error("listing is not active: {id}")]
    ListingNotActive {
        /// The listing id.
        id: String,
    },

    /// The listing already has a live trade against it.
    #[error("listing already has a live trade: {id}")]
    ListingBusy {
        /// The listing id.
        id: String,
    },

    /// A store capacity limit was reached.
    #[error("capacity exceeded: {reason}")]
    Capacity {
        /// What ran out.
        reason: String,
    },

    /// The custody backend rejected or failed the operation.
    #[error("custody error: {0}")]
    Custody(#[from] CustodyError),
}
