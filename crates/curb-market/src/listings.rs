//! Listing service: create and query listings.
//!
//! Pure CRUD over the entity store; the only invariants are term
//! validation at creation time. Deactivation is driven by the trade
//! state machine, never directly from here.

use std::sync::Arc;

use chrono::Utc;
use curb_core::{Address, Listing, ListingDraft};
use tracing::info;
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::{MarketError, MarketResult};
use crate::store::{MarketEvent, MarketStore};

/// Service for posting and browsing listings.
#[derive(Debug, Clone)]
pub struct ListingService {
    store: Arc<MarketStore>,
    config: MarketConfig,
}

impl ListingService {
    /// Creates a listing service over a shared store.
    #[must_use]
    pub fn new(store: Arc<MarketStore>, config: MarketConfig) -> Self {
        Self { store, config }
    }

    /// Posts a new active listing owned by `owner`.
    ///
    /// The owner's profile is created on first sight.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad terms and `Capacity` when the listing
    /// table is full.
    pub fn create_listing(&self, owner: &Address, draft: ListingDraft) -> MarketResult<Listing> {
        draft.validate()?;

        let listing = self.store.commit(|state| {
            if state.listings.len() >= self.config.max_listings {
                return Err(MarketError::Capacity {
                    reason: format!("maximum listings ({}) reached", self.config.max_listings),
                });
            }

            let now = Utc::now();
            let id = Uuid::new_v4().to_string();
            let listing = Listing::from_draft(id.clone(), owner.clone(), now, draft);

            state.ensure_profile(owner, now);
            state.listings.put(id.clone(), listing.clone());
            state.record(MarketEvent::ListingCreated(id));

            Ok(listing)
        })?;

        info!(
            listing_id = %listing.id,
            owner = %owner,
            direction = ?listing.direction,
            "listing created"
        );

        Ok(listing)
    }

    /// Fetches a listing by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not resolve.
    pub fn get_listing(&self, id: &str) -> MarketResult<Listing> {
        self.store
            .read(|state| state.listings.get(id).cloned())
            .ok_or_else(|| MarketError::NotFound {
                kind: "listing",
                id: id.to_string(),
            })
    }

    /// All active listings, in insertion order.
    #[must_use]
    pub fn list_active(&self) -> Vec<Listing> {
        self.store.read(|state| state.listings.list(Listing::is_active))
    }

    /// Active listings posted by `owner`, in insertion order.
    #[must_use]
    pub fn list_active_by(&self, owner: &Address) -> Vec<Listing> {
        self.store.read(|state| {
            state
                .listings
                .list(|l| l.is_active() && &l.created_by == owner)
        })
    }

    /// Every listing regardless of status, in insertion order.
    #[must_use]
    pub fn list_all(&self) -> Vec<Listing> {
        self.store.read(|state| state.listings.list(|_| true))
    }
}
