//! Custody backend seam.
//!
//! `fund_escrow` and `release_escrow` are designed to call out to a real
//! custody mechanism (on-chain contract, multisig) and only flip local
//! status after that call succeeds. The reference system has no such
//! mechanism; [`NullCustody`] makes the gap explicit and lets tests inject
//! failures.

use std::fmt;

use curb_core::{Amount, CryptoKind, Escrow};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by a custody backend.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// The backend rejected the operation.
    #[error("custody backend rejected {operation}: {reason}")]
    Rejected {
        /// Which custody call failed.
        operation: &'static str,
        /// Backend-supplied reason.
        reason: String,
    },

    /// The backend could not be reached.
    #[error("custody backend unavailable: {0}")]
    Unavailable(String),
}

/// External custody mechanism holding the crypto leg of a trade.
///
/// Implementations must be side-effect-complete before returning `Ok`: the
/// state machine commits the local transition only after the call succeeds.
pub trait CustodyBackend: Send + Sync + fmt::Debug {
    /// Locks the crypto leg for the given escrow.
    ///
    /// # Errors
    ///
    /// Returns a [`CustodyError`] if the funds could not be locked.
    fn fund(&self, escrow: &Escrow, kind: CryptoKind, amount: Amount) -> Result<(), CustodyError>;

    /// Releases the held crypto to the buyer.
    ///
    /// # Errors
    ///
    /// Returns a [`CustodyError`] if the release did not go through.
    fn release(&self, escrow: &Escrow) -> Result<(), CustodyError>;

    /// Returns the held crypto to the seller.
    ///
    /// # Errors
    ///
    /// Returns a [`CustodyError`] if the refund did not go through.
    fn refund(&self, escrow: &Escrow) -> Result<(), CustodyError>;
}

/// In-process custody stand-in that always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCustody;

impl CustodyBackend for NullCustody {
    fn fund(&self, escrow: &Escrow, kind: CryptoKind, amount: Amount) -> Result<(), CustodyError> {
        debug!(escrow_id = %escrow.id, kind = ?kind, amount = %amount, "null custody: fund");
        Ok(())
    }

    fn release(&self, escrow: &Escrow) -> Result<(), CustodyError> {
        debug!(escrow_id = %escrow.id, "null custody: release");
        Ok(())
    }

    fn refund(&self, escrow: &Escrow) -> Result<(), CustodyError> {
        debug!(escrow_id = %escrow.id, "null custody: refund");
        Ok(())
    }
}
