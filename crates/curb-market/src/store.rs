//! Keyed entity storage with one atomic commit unit.
//!
//! All four entity tables live inside a single [`MarketState`] guarded by
//! one `parking_lot::RwLock`. Every state-machine transition mutates the
//! state through [`MarketStore::commit`], so a transaction, its escrow,
//! the parent listing, and profile counters always move together: readers
//! can never observe a half-applied transition.
//!
//! With a data directory configured, each table is re-snapshotted to JSON
//! after every successful commit, still inside the write lock.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use curb_core::{Address, Escrow, Listing, Transaction, UserProfile};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MarketResult;

/// Cap on the retained event log.
const MAX_EVENTS: usize = 1024;

/// Events emitted on marketplace lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    /// A listing was posted.
    ListingCreated(String),

    /// A trade was opened against a listing.
    TradeOpened {
        /// The new transaction id.
        transaction_id: String,
        /// The listing traded against.
        listing_id: String,
    },

    /// The seller funded the escrow.
    EscrowFunded(String),

    /// The buyer confirmed the cash handover.
    CashDelivered(String),

    /// The escrow was released and the trade completed.
    EscrowReleased {
        /// The escrow id.
        escrow_id: String,
        /// The owning transaction id.
        transaction_id: String,
    },

    /// A trade was cancelled (user action or funding timeout).
    TradeCancelled(String),

    /// A trade was disputed.
    TradeDisputed(String),
}

/// An insertion-ordered keyed table.
///
/// `put` with a fresh id appends to the order; `put` with a known id is a
/// full replace that keeps the original position, so `list` output is
/// stable across updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<T> {
    order: Vec<String>,
    entries: HashMap<String, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    /// Looks up an entity by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    /// Mutable lookup; only reachable through a store commit.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Inserts or fully replaces an entity under the given id.
    pub fn put(&mut self, id: String, entity: T) {
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.insert(id, entity);
    }

    /// All entities matching the predicate, in insertion order.
    #[must_use]
    pub fn list<P: Fn(&T) -> bool>(&self, predicate: P) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The complete mutable marketplace state.
#[derive(Debug, Default)]
pub struct MarketState {
    /// All listings by id.
    pub listings: Table<Listing>,

    /// All transactions by id.
    pub transactions: Table<Transaction>,

    /// All escrows by id.
    pub escrows: Table<Escrow>,

    /// All user profiles by address.
    pub profiles: Table<UserProfile>,

    /// Recent lifecycle events (bounded).
    events: Vec<MarketEvent>,
}

impl MarketState {
    /// Records a lifecycle event, dropping the oldest past the cap.
    pub fn record(&mut self, event: MarketEvent) {
        self.events.push(event);
        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - MAX_EVENTS;
            self.events.drain(..excess);
        }
    }

    /// Creates a profile for an address on first sight.
    pub fn ensure_profile(&mut self, address: &Address, now: DateTime<Utc>) {
        if self.profiles.get(address.as_str()).is_none() {
            debug!(address = %address, "creating profile on first sight");
            self.profiles.put(
                address.as_str().to_string(),
                UserProfile::new(address.clone(), now),
            );
        }
    }

    /// Bumps the completed-trade counter for a participant.
    pub fn record_completion(&mut self, address: &Address, now: DateTime<Utc>) {
        self.ensure_profile(address, now);
        if let Some(profile) = self.profiles.get_mut(address.as_str()) {
            profile.completed_transactions += 1;
        }
    }
}

/// Per-table JSON snapshot files.
#[derive(Debug)]
struct Snapshots {
    listings: curb_persist::JsonStore,
    transactions: curb_persist::JsonStore,
    escrows: curb_persist::JsonStore,
    profiles: curb_persist::JsonStore,
}

/// Shared entity store for the marketplace services.
#[derive(Debug)]
pub struct MarketStore {
    state: RwLock<MarketState>,
    snapshots: Option<Snapshots>,
}

impl MarketStore {
    /// Creates an empty, non-persistent store (test configuration).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(MarketState::default()),
            snapshots: None,
        }
    }

    /// Opens a persistent store, loading any snapshots under `dir`.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let snapshots = Snapshots {
            listings: curb_persist::JsonStore::new(dir, "listings"),
            transactions: curb_persist::JsonStore::new(dir, "transactions"),
            escrows: curb_persist::JsonStore::new(dir, "escrows"),
            profiles: curb_persist::JsonStore::new(dir, "profiles"),
        };

        let state = MarketState {
            listings: snapshots.listings.load(),
            transactions: snapshots.transactions.load(),
            escrows: snapshots.escrows.load(),
            profiles: snapshots.profiles.load(),
            events: Vec::new(),
        };

        debug!(
            listings = state.listings.len(),
            transactions = state.transactions.len(),
            escrows = state.escrows.len(),
            profiles = state.profiles.len(),
            "loaded marketplace state from disk"
        );

        Self {
            state: RwLock::new(state),
            snapshots: Some(snapshots),
        }
    }

    /// Runs a read-only view under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        f(&self.state.read())
    }

    /// Applies a mutation atomically under the write lock.
    ///
    /// The closure's changes become visible to readers all at once; on
    /// success the tables are re-snapshotted before the lock drops. On
    /// error nothing is persisted (callers must not leave partial
    /// mutations behind on error paths).
    ///
    /// # Errors
    ///
    /// Propagates the closure's error unchanged.
    pub fn commit<T>(&self, f: impl FnOnce(&mut MarketState) -> MarketResult<T>) -> MarketResult<T> {
        let mut state = self.state.write();
        let result = f(&mut state)?;
        self.snapshot(&state);
        Ok(result)
    }

    /// Recent lifecycle events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<MarketEvent> {
        self.state.read().events.clone()
    }

    fn snapshot(&self, state: &MarketState) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };

        save_table(&snapshots.listings, &state.listings);
        save_table(&snapshots.transactions, &state.transactions);
        save_table(&snapshots.escrows, &state.escrows);
        save_table(&snapshots.profiles, &state.profiles);
    }
}

fn save_table<T: Serialize>(store: &curb_persist::JsonStore, table: &Table<T>) {
    if let Err(e) = store.save(table) {
        warn!(error = %e, "failed to snapshot table");
    }
}
