//! Curbside API server binary.

use std::sync::Arc;

use curb_api::{ApiConfig, ApiServer};
use curb_market::{ListingService, MarketConfig, MarketStore, TradeService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();

    let store = match &config.data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "opening persistent store");
            Arc::new(MarketStore::open(dir))
        }
        None => {
            warn!("CURB_DATA_DIR not set, running with an in-memory store");
            Arc::new(MarketStore::in_memory())
        }
    };

    let market_config = MarketConfig::default();
    let listings = ListingService::new(store.clone(), market_config.clone());
    let trades = TradeService::new(store, market_config);

    let server = ApiServer::new(config.clone(), listings, trades);

    server
        .serve_with_shutdown(config.bind_addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
