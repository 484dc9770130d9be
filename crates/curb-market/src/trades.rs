//! Trade orchestration: the transaction/escrow state machine.
//!
//! Every operation here touches two records that must move together (a
//! transaction and its paired escrow, sometimes the parent listing and the
//! participants' profiles too), so each one runs as a single
//! [`MarketStore::commit`]. Two racing calls serialize on the store's
//! write lock: the first wins, the second sees the already-advanced state
//! and fails with `InvalidTransition` rather than silently succeeding.
//!
//! Authorization is enforced here, server-side, not in whatever UI sits in
//! front: funding and release are seller moves (the seller holds the
//! crypto), cash confirmation is a buyer move (only the buyer can attest
//! the handover), cancel and dispute are open to either participant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use curb_core::{
    Address, Escrow, EscrowStatus, Transaction, TransactionStatus, UserProfile,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::custody::{CustodyBackend, NullCustody};
use crate::error::{MarketError, MarketResult};
use crate::store::{MarketEvent, MarketState, MarketStore};

/// Service driving the trade lifecycle.
#[derive(Debug, Clone)]
pub struct TradeService {
    store: Arc<MarketStore>,
    custody: Arc<dyn CustodyBackend>,
    config: MarketConfig,
}

impl TradeService {
    /// Creates a trade service with the in-process custody stand-in.
    #[must_use]
    pub fn new(store: Arc<MarketStore>, config: MarketConfig) -> Self {
        Self::with_custody(store, config, Arc::new(NullCustody))
    }

    /// Creates a trade service with an explicit custody backend.
    #[must_use]
    pub fn with_custody(
        store: Arc<MarketStore>,
        config: MarketConfig,
        custody: Arc<dyn CustodyBackend>,
    ) -> Self {
        Self {
            store,
            custody,
            config,
        }
    }

    /// Opens a trade against an active listing.
    ///
    /// The transaction and its escrow are created together, cross-linked,
    /// with the listing creator as seller and `buyer` as initiator.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown listing, `SelfTrade` when the
    /// buyer owns the listing, `ListingNotActive`/`ListingBusy` when the
    /// listing cannot take a trade, and `Capacity` when the transaction
    /// table is full.
    pub fn open_trade(&self, listing_id: &str, buyer: &Address) -> MarketResult<Transaction> {
        let transaction = self.store.commit(|state| {
            let listing = state
                .listings
                .get(listing_id)
                .cloned()
                .ok_or_else(|| MarketError::NotFound {
                    kind: "listing",
                    id: listing_id.to_string(),
                })?;

            if listing.created_by == *buyer {
                return Err(MarketError::SelfTrade);
            }
            if !listing.is_active() {
                return Err(MarketError::ListingNotActive {
                    id: listing.id.clone(),
                });
            }

            let has_live_trade = !state
                .transactions
                .list(|t| t.listing_id == listing.id && !t.status.is_terminal())
                .is_empty();
            if has_live_trade {
                return Err(MarketError::ListingBusy {
                    id: listing.id.clone(),
                });
            }

            if state.transactions.len() >= self.config.max_transactions {
                return Err(MarketError::Capacity {
                    reason: format!(
                        "maximum transactions ({}) reached",
                        self.config.max_transactions
                    ),
                });
            }

            let now = Utc::now();
            let transaction_id = Uuid::new_v4().to_string();
            let escrow_id = Uuid::new_v4().to_string();

            let transaction = Transaction::open(
                transaction_id.clone(),
                escrow_id.clone(),
                &listing,
                buyer.clone(),
                now,
            );
            let escrow = Escrow::new(escrow_id.clone(), transaction_id.clone());

            state.ensure_profile(buyer, now);
            state
                .transactions
                .put(transaction_id.clone(), transaction.clone());
            state.escrows.put(escrow_id, escrow);
            state.record(MarketEvent::TradeOpened {
                transaction_id,
                listing_id: listing.id,
            });

            Ok(transaction)
        })?;

        info!(
            transaction_id = %transaction.id,
            listing_id = %transaction.listing_id,
            buyer = %buyer,
            seller = %transaction.seller,
            "trade opened"
        );

        Ok(transaction)
    }

    /// Seller locks the crypto leg in escrow.
    ///
    /// Calls the custody backend first; local state flips only after the
    /// backend accepts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown escrow, `Unauthorized` when the
    /// caller is not the seller, `InvalidTransition` when the pair is not
    /// in `Pending`/`pending`, and `Custody` if the backend fails.
    pub fn fund_escrow(&self, escrow_id: &str, caller: &Address) -> MarketResult<Escrow> {
        let escrow = self.store.commit(|state| {
            let escrow = lookup_escrow(state, escrow_id)?;
            let transaction = lookup_transaction(state, &escrow.transaction_id)?;

            if *caller != transaction.seller {
                return Err(MarketError::Unauthorized {
                    action: "fund escrow",
                    caller: caller.to_string(),
                });
            }
            check_transition(transaction.status, TransactionStatus::EscrowFunded)?;
            check_escrow_transition(escrow.status, EscrowStatus::Funded)?;

            self.custody
                .fund(&escrow, transaction.crypto_kind, transaction.crypto_amount)?;

            let now = Utc::now();
            advance_escrow(state, escrow_id, EscrowStatus::Funded, now)?;
            advance_transaction(state, &transaction.id, TransactionStatus::EscrowFunded, now)?;
            state.record(MarketEvent::EscrowFunded(escrow_id.to_string()));

            lookup_escrow(state, escrow_id)
        })?;

        info!(escrow_id = %escrow.id, transaction_id = %escrow.transaction_id, "escrow funded");

        Ok(escrow)
    }

    /// Buyer attests the cash was physically handed over.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown transaction, `Unauthorized` when
    /// the caller is not the buyer, and `InvalidTransition` unless the
    /// trade is in `EscrowFunded`.
    pub fn confirm_cash_delivered(
        &self,
        transaction_id: &str,
        caller: &Address,
    ) -> MarketResult<Transaction> {
        let transaction = self.store.commit(|state| {
            let transaction = lookup_transaction(state, transaction_id)?;

            if *caller != transaction.buyer {
                return Err(MarketError::Unauthorized {
                    action: "confirm cash delivery",
                    caller: caller.to_string(),
                });
            }
            check_transition(transaction.status, TransactionStatus::CashDelivered)?;

            let now = Utc::now();
            advance_transaction(state, transaction_id, TransactionStatus::CashDelivered, now)?;
            state.record(MarketEvent::CashDelivered(transaction_id.to_string()));

            lookup_transaction(state, transaction_id)
        })?;

        info!(transaction_id = %transaction.id, "cash delivery confirmed");

        Ok(transaction)
    }

    /// Seller releases the escrow to the buyer, completing the trade.
    ///
    /// Completion retires the parent listing and bumps both participants'
    /// completed-trade counters, all in the same commit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown escrow, `Unauthorized` when the
    /// caller is not the seller, `InvalidTransition` unless the pair is in
    /// `CashDelivered`/`funded`, and `Custody` if the backend fails.
    pub fn release_escrow(&self, escrow_id: &str, caller: &Address) -> MarketResult<Escrow> {
        let escrow = self.store.commit(|state| {
            let escrow = lookup_escrow(state, escrow_id)?;
            let transaction = lookup_transaction(state, &escrow.transaction_id)?;

            if *caller != transaction.seller {
                return Err(MarketError::Unauthorized {
                    action: "release escrow",
                    caller: caller.to_string(),
                });
            }
            check_transition(transaction.status, TransactionStatus::Completed)?;
            check_escrow_transition(escrow.status, EscrowStatus::Released)?;

            self.custody.release(&escrow)?;

            let now = Utc::now();
            advance_escrow(state, escrow_id, EscrowStatus::Released, now)?;
            advance_transaction(state, &transaction.id, TransactionStatus::Completed, now)?;
            retire_listing(state, &transaction.listing_id);
            state.record_completion(&transaction.seller, now);
            state.record_completion(&transaction.buyer, now);
            state.record(MarketEvent::EscrowReleased {
                escrow_id: escrow_id.to_string(),
                transaction_id: transaction.id.clone(),
            });

            lookup_escrow(state, escrow_id)
        })?;

        info!(
            escrow_id = %escrow.id,
            transaction_id = %escrow.transaction_id,
            "escrow released, trade completed"
        );

        Ok(escrow)
    }

    /// Either participant abandons a trade that has not completed.
    ///
    /// A funded escrow is refunded through custody before the transaction
    /// flips; an unfunded escrow is left pending. The parent listing is
    /// retired either way.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized` for non-participants,
    /// `InvalidTransition` from terminal states, and `Custody` if the
    /// refund fails.
    pub fn cancel_trade(&self, transaction_id: &str, caller: &Address) -> MarketResult<Transaction> {
        let transaction = self.store.commit(|state| {
            let transaction = lookup_transaction(state, transaction_id)?;

            if !transaction.involves(caller) {
                return Err(MarketError::Unauthorized {
                    action: "cancel trade",
                    caller: caller.to_string(),
                });
            }
            check_transition(transaction.status, TransactionStatus::Cancelled)?;

            let escrow = lookup_escrow(state, &transaction.escrow_id)?;
            let now = Utc::now();

            if escrow.status == EscrowStatus::Funded {
                self.custody.refund(&escrow)?;
                advance_escrow(state, &escrow.id, EscrowStatus::Refunded, now)?;
            }

            advance_transaction(state, transaction_id, TransactionStatus::Cancelled, now)?;
            retire_listing(state, &transaction.listing_id);
            state.record(MarketEvent::TradeCancelled(transaction_id.to_string()));

            lookup_transaction(state, transaction_id)
        })?;

        info!(transaction_id = %transaction.id, caller = %caller, "trade cancelled");

        Ok(transaction)
    }

    /// Either participant escalates a trade to dispute.
    ///
    /// A funded escrow stays funded (custody keeps holding) until the
    /// dispute is resolved off-system; the parent listing is retired.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized` for non-participants, and
    /// `InvalidTransition` from terminal states.
    pub fn dispute_trade(
        &self,
        transaction_id: &str,
        caller: &Address,
    ) -> MarketResult<Transaction> {
        let transaction = self.store.commit(|state| {
            let transaction = lookup_transaction(state, transaction_id)?;

            if !transaction.involves(caller) {
                return Err(MarketError::Unauthorized {
                    action: "dispute trade",
                    caller: caller.to_string(),
                });
            }
            check_transition(transaction.status, TransactionStatus::Disputed)?;

            let now = Utc::now();
            advance_transaction(state, transaction_id, TransactionStatus::Disputed, now)?;
            retire_listing(state, &transaction.listing_id);
            state.record(MarketEvent::TradeDisputed(transaction_id.to_string()));

            lookup_transaction(state, transaction_id)
        })?;

        warn!(transaction_id = %transaction.id, caller = %caller, "trade disputed");

        Ok(transaction)
    }

    /// Cancels every pending trade older than the configured funding
    /// timeout. Returns the number of trades cancelled.
    ///
    /// This is the operator-driven sweep standing in for a funding
    /// timeout; there is no background task.
    pub fn expire_pending(&self) -> usize {
        let timeout = chrono::Duration::from_std(self.config.funding_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(1));
        let cutoff = Utc::now() - timeout;

        let expired = self
            .store
            .commit(|state| {
                let stale = state
                    .transactions
                    .list(|t| t.status == TransactionStatus::Pending && t.created_at < cutoff);

                let now = Utc::now();
                for transaction in &stale {
                    advance_transaction(state, &transaction.id, TransactionStatus::Cancelled, now)?;
                    retire_listing(state, &transaction.listing_id);
                    state.record(MarketEvent::TradeCancelled(transaction.id.clone()));
                }

                Ok(stale.len())
            })
            .unwrap_or(0);

        if expired > 0 {
            info!(expired, "expired stale pending trades");
        }

        expired
    }

    /// Fetches a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not resolve.
    pub fn get_transaction(&self, id: &str) -> MarketResult<Transaction> {
        self.store.read(|state| lookup_transaction(state, id))
    }

    /// Every transaction the address participates in, insertion order.
    #[must_use]
    pub fn transactions_for(&self, address: &Address) -> Vec<Transaction> {
        self.store
            .read(|state| state.transactions.list(|t| t.involves(address)))
    }

    /// Fetches an escrow by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not resolve.
    pub fn get_escrow(&self, id: &str) -> MarketResult<Escrow> {
        self.store.read(|state| lookup_escrow(state, id))
    }

    /// Fetches the escrow paired with a transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either id does not resolve.
    pub fn escrow_for_transaction(&self, transaction_id: &str) -> MarketResult<Escrow> {
        self.store.read(|state| {
            let transaction = lookup_transaction(state, transaction_id)?;
            lookup_escrow(state, &transaction.escrow_id)
        })
    }

    /// Fetches the profile for an address, if the address has been seen.
    #[must_use]
    pub fn profile(&self, address: &Address) -> Option<UserProfile> {
        self.store
            .read(|state| state.profiles.get(address.as_str()).cloned())
    }
}

fn lookup_transaction(state: &MarketState, id: &str) -> MarketResult<Transaction> {
    state
        .transactions
        .get(id)
        .cloned()
        .ok_or_else(|| MarketError::NotFound {
            kind: "transaction",
            id: id.to_string(),
        })
}

fn lookup_escrow(state: &MarketState, id: &str) -> MarketResult<Escrow> {
    state
        .escrows
        .get(id)
        .cloned()
        .ok_or_else(|| MarketError::NotFound {
            kind: "escrow",
            id: id.to_string(),
        })
}

fn check_transition(from: TransactionStatus, to: TransactionStatus) -> MarketResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(MarketError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn check_escrow_transition(from: EscrowStatus, to: EscrowStatus) -> MarketResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(MarketError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn advance_transaction(
    state: &mut MarketState,
    id: &str,
    target: TransactionStatus,
    now: DateTime<Utc>,
) -> MarketResult<()> {
    let transaction = state
        .transactions
        .get_mut(id)
        .ok_or_else(|| MarketError::NotFound {
            kind: "transaction",
            id: id.to_string(),
        })?;

    check_transition(transaction.status, target)?;
    transaction.status = target;
    transaction.updated_at = now;
    Ok(())
}

fn advance_escrow(
    state: &mut MarketState,
    id: &str,
    target: EscrowStatus,
    now: DateTime<Utc>,
) -> MarketResult<()> {
    let escrow = state
        .escrows
        .get_mut(id)
        .ok_or_else(|| MarketError::NotFound {
            kind: "escrow",
            id: id.to_string(),
        })?;

    check_escrow_transition(escrow.status, target)?;
    escrow.status = target;
    match target {
        EscrowStatus::Funded => escrow.funded_at = Some(now),
        EscrowStatus::Released => escrow.released_at = Some(now),
        EscrowStatus::Pending | EscrowStatus::Refunded => {}
    }
    Ok(())
}

fn retire_listing(state: &mut MarketState, listing_id: &str) {
    if let Some(listing) = state.listings.get_mut(listing_id) {
        listing.status = curb_core::ListingStatus::Inactive;
    }
}
