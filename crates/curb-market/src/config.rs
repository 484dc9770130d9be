//! Marketplace service configuration.

use std::time::Duration;

/// Configuration shared by the listing and trade services.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Maximum number of listings the store will hold.
    pub max_listings: usize,

    /// Maximum number of transactions the store will hold.
    pub max_transactions: usize,

    /// How long a pending trade may wait for escrow funding before an
    /// `expire_pending` sweep cancels it.
    pub funding_timeout: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_listings: 10_000,
            max_transactions: 100_000,
            funding_timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl MarketConfig {
    /// Set the maximum number of listings.
    #[must_use]
    pub const fn with_max_listings(mut self, max: usize) -> Self {
        self.max_listings = max;
        self
    }

    /// Set the maximum number of transactions.
    #[must_use]
    pub const fn with_max_transactions(mut self, max: usize) -> Self {
        self.max_transactions = max;
        self
    }

    /// Set the funding timeout for the expiry sweep.
    #[must_use]
    pub const fn with_funding_timeout(mut self, timeout: Duration) -> Self {
        self.funding_timeout = timeout;
        self
    }
}
