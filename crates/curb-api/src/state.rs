//! Shared state for the API server.

use std::sync::Arc;
use std::time::Instant;

use curb_market::{ListingService, TradeService};

use crate::config::ApiConfig;

/// Shared state for the API server.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Server configuration.
    config: Arc<ApiConfig>,
    /// Listing service.
    listings: ListingService,
    /// Trade state machine service.
    trades: TradeService,
    /// Server start time.
    start_time: Instant,
}

impl ApiState {
    /// Create shared state over the marketplace services.
    #[must_use]
    pub fn new(config: ApiConfig, listings: ListingService, trades: TradeService) -> Self {
        Self {
            config: Arc::new(config),
            listings,
            trades,
            start_time: Instant::now(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Get the listing service.
    #[must_use]
    pub fn listings(&self) -> &ListingService {
        &self.listings
    }

    /// Get the trade service.
    #[must_use]
    pub fn trades(&self) -> &TradeService {
        &self.trades
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
