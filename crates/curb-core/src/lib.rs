//! # curb-core
//!
//! Domain primitives for the Curbside peer-to-peer crypto-for-cash
//! marketplace.
//!
//! This crate provides:
//!
//! - Entity types: [`Listing`], [`Transaction`], [`Escrow`], [`UserProfile`]
//! - Status enums with transition tables ([`TransactionStatus`], [`EscrowStatus`])
//! - Fixed-point [`Amount`] for crypto and cash legs
//! - Validated wallet [`Address`]
//! - Display helpers for read models

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod error;
pub mod format;
pub mod types;

pub use address::Address;
pub use amount::Amount;
pub use error::ValidationError;
pub use format::{format_cash, format_crypto, listing_direction_label, transaction_status_label};
pub use types::{
    CryptoKind, Escrow, EscrowStatus, Listing, ListingDirection, ListingDraft, ListingStatus,
    SettlementMode, Transaction, TransactionStatus, UserProfile,
};
