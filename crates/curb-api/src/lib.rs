//! # curb-api
//!
//! HTTP API for the Curbside peer-to-peer crypto-for-cash marketplace,
//! built on the axum HTTP framework.
//!
//! Caller identity arrives as an already-verified wallet address in the
//! `x-wallet-address` header; all state and actor checks happen in the
//! `curb-market` state machine, never here.
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/health` | GET | Health check with uptime |
//! | `/api/listings` | GET/POST | Browse or post listings |
//! | `/api/listings/{id}` | GET | Fetch one listing |
//! | `/api/transactions` | GET/POST | Caller's trades / open a trade |
//! | `/api/transactions/{id}` | GET | Transaction with its escrow |
//! | `/api/transactions/{id}/cash-delivered` | POST | Buyer confirms handover |
//! | `/api/transactions/{id}/cancel` | POST | Participant cancels |
//! | `/api/transactions/{id}/dispute` | POST | Participant disputes |
//! | `/api/escrows/{id}` | GET | Fetch one escrow |
//! | `/api/escrows/{id}/fund` | POST | Seller funds the escrow |
//! | `/api/escrows/{id}/release` | POST | Seller releases the escrow |
//! | `/api/profiles/{address}` | GET | Fetch a user profile |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::ApiServer;
pub use state::ApiState;
