//! HTTP request handlers for the marketplace API.
//!
//! Caller identity arrives in the `x-wallet-address` header, already
//! verified by the wallet provider; handlers parse it, dispatch to the
//! services, and translate typed errors into status codes. No state or
//! actor check lives here — the state machine enforces those.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use curb_core::{Address, Escrow, Listing, ListingDraft, Transaction, UserProfile};
use curb_market::MarketError;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

/// Header carrying the authenticated wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Query parameters for listing browsing.
#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    /// Filter by owner address.
    pub owner: Option<String>,
    /// Include inactive listings.
    pub all: Option<bool>,
}

/// Request body for opening a trade.
#[derive(Debug, Deserialize)]
pub struct OpenTradeRequest {
    /// The listing to trade against.
    pub listing_id: String,
}

/// A transaction together with its paired escrow.
#[derive(Debug, Serialize)]
pub struct TradeView {
    /// The transaction record.
    pub transaction: Transaction,
    /// The paired escrow record.
    pub escrow: Escrow,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Extracts the authenticated wallet identity from request headers.
fn wallet_identity(headers: &HeaderMap) -> ApiResult<Address> {
    headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| Address::new(raw).ok())
        .ok_or(ApiError::MissingIdentity)
}

/// Parses an address from a path or query string.
fn parse_address(raw: &str) -> ApiResult<Address> {
    Address::new(raw).map_err(|e| ApiError::Market(MarketError::Validation(e)))
}

/// Handle GET /api/health - health check endpoint.
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle GET /api/listings - browse listings.
pub async fn list_listings(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListingsQuery>,
) -> ApiResult<Json<Vec<Listing>>> {
    if query.all.unwrap_or(false) {
        return Ok(Json(state.listings().list_all()));
    }

    let listings = match &query.owner {
        Some(raw) => {
            let owner = parse_address(raw)?;
            state.listings().list_active_by(&owner)
        }
        None => state.listings().list_active(),
    };

    Ok(Json(listings))
}

/// Handle POST /api/listings - post a new listing.
pub async fn create_listing(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(draft): Json<ListingDraft>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let owner = wallet_identity(&headers)?;
    let listing = state.listings().create_listing(&owner, draft)?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Handle GET `/api/listings/:id` - fetch a listing.
pub async fn get_listing(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Listing>> {
    Ok(Json(state.listings().get_listing(&id)?))
}

/// Handle GET /api/transactions - the caller's transactions.
pub async fn list_transactions(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Transaction>>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().transactions_for(&caller)))
}

/// Handle POST /api/transactions - open a trade against a listing.
pub async fn open_trade(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<OpenTradeRequest>,
) -> ApiResult<(StatusCode, Json<TradeView>)> {
    let buyer = wallet_identity(&headers)?;
    let transaction = state.trades().open_trade(&request.listing_id, &buyer)?;
    let escrow = state.trades().get_escrow(&transaction.escrow_id)?;

    Ok((
        StatusCode::CREATED,
        Json(TradeView {
            transaction,
            escrow,
        }),
    ))
}

/// Handle GET `/api/transactions/:id` - transaction with its escrow.
pub async fn get_transaction(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TradeView>> {
    let transaction = state.trades().get_transaction(&id)?;
    let escrow = state.trades().get_escrow(&transaction.escrow_id)?;
    Ok(Json(TradeView {
        transaction,
        escrow,
    }))
}

/// Handle POST `/api/transactions/:id/cash-delivered` - buyer confirms
/// the cash handover.
pub async fn confirm_cash_delivered(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Transaction>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().confirm_cash_delivered(&id, &caller)?))
}

/// Handle POST `/api/transactions/:id/cancel` - participant cancels.
pub async fn cancel_trade(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Transaction>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().cancel_trade(&id, &caller)?))
}

/// Handle POST `/api/transactions/:id/dispute` - participant disputes.
pub async fn dispute_trade(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Transaction>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().dispute_trade(&id, &caller)?))
}

/// Handle GET `/api/escrows/:id` - fetch an escrow.
pub async fn get_escrow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Escrow>> {
    Ok(Json(state.trades().get_escrow(&id)?))
}

/// Handle POST `/api/escrows/:id/fund` - seller funds the escrow.
pub async fn fund_escrow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Escrow>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().fund_escrow(&id, &caller)?))
}

/// Handle POST `/api/escrows/:id/release` - seller releases the escrow.
pub async fn release_escrow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Escrow>> {
    let caller = wallet_identity(&headers)?;
    Ok(Json(state.trades().release_escrow(&id, &caller)?))
}

/// Handle GET `/api/profiles/:address` - fetch a user profile.
pub async fn get_profile(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let address = parse_address(&address)?;
    state
        .trades()
        .profile(&address)
        .map(Json)
        .ok_or_else(|| {
            ApiError::Market(MarketError::NotFound {
                kind: "profile",
                id: address.to_string(),
            })
        })
}
