//! # curb-market
//!
//! Marketplace core for Curbside peer-to-peer crypto-for-cash trading.
//!
//! This crate provides:
//!
//! - [`MarketStore`]: keyed entity storage with one atomic commit unit and
//!   optional JSON snapshot persistence
//! - [`ListingService`]: posting and browsing listings
//! - [`TradeService`]: the transaction/escrow state machine with
//!   server-side actor checks
//! - [`CustodyBackend`]: the seam to a real custody mechanism, with
//!   [`NullCustody`] as the in-process stand-in

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod custody;
pub mod error;
pub mod listings;
pub mod store;
pub mod trades;

pub use config::MarketConfig;
pub use custody::{CustodyBackend, CustodyError, NullCustody};
pub use error::{MarketError, MarketResult};
pub use listings::ListingService;
pub use store::{MarketEvent, MarketState, MarketStore, Table};
pub use trades::TradeService;
