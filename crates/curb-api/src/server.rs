//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use curb_market::{ListingService, TradeService};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::ApiState;

/// HTTP server for the marketplace API.
#[derive(Debug, Clone)]
pub struct ApiServer {
    state: Arc<ApiState>,
}

impl ApiServer {
    /// Create a new API server over the marketplace services.
    #[must_use]
    pub fn new(config: ApiConfig, listings: ListingService, trades: TradeService) -> Self {
        let state = Arc::new(ApiState::new(config, listings, trades));
        Self { state }
    }

    /// Get the shared state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Start the server and listen for connections.
    ///
    /// Runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> ApiResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        info!(addr = %addr, "API server listening");

        let router = create_router(self.state.clone());

        axum::serve(listener, router)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server shuts down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        info!(addr = %addr, "API server listening");

        let router = create_router(self.state.clone());

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("API server shut down");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use curb_market::{MarketConfig, MarketStore};

    use super::*;

    fn make_server() -> ApiServer {
        let store = Arc::new(MarketStore::in_memory());
        let config = MarketConfig::default();
        ApiServer::new(
            ApiConfig::default(),
            ListingService::new(store.clone(), config.clone()),
            TradeService::new(store, config),
        )
    }

    #[tokio::test]
    async fn serve_with_shutdown_stops_cleanly() {
        let server = make_server();
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));

        // Shut down immediately; serve must return Ok once the future fires.
        let result = server.serve_with_shutdown(addr, async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let server = make_server();

        // Occupy a port, then try to serve on it.
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = taken.local_addr().expect("addr");

        let result = server.serve(addr).await;
        assert!(matches!(result, Err(ApiError::BindFailed(_, _))));
    }
}
