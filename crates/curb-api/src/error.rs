//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use curb_market::MarketError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur in the API server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// The request carried no usable wallet identity.
    #[error("missing or malformed x-wallet-address header")]
    MissingIdentity,

    /// A marketplace operation failed.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::MissingIdentity => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Market(e) => match e {
                MarketError::Validation(_) | MarketError::SelfTrade => {
                    (StatusCode::BAD_REQUEST, "invalid_request")
                }
                MarketError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                MarketError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "forbidden"),
                MarketError::InvalidTransition { .. }
                | MarketError::ListingNotActive { .. }
                | MarketError::ListingBusy { .. } => (StatusCode::CONFLICT, "conflict"),
                MarketError::Capacity { .. } => (StatusCode::SERVICE_UNAVAILABLE, "capacity"),
                MarketError::Custody(_) => (StatusCode::BAD_GATEWAY, "custody_error"),
            },
            Self::BindFailed(_, _) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
