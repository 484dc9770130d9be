//! Concurrency tests for the trade state machine.
//!
//! Racing transitions must serialize on the store's write lock: exactly
//! one caller wins, the loser sees `InvalidTransition`, and the pair is
//! never observable in a half-applied state.

use std::sync::Arc;

use curb_core::{
    Address, Amount, CryptoKind, EscrowStatus, ListingDirection, ListingDraft, SettlementMode,
    TransactionStatus,
};
use curb_market::{ListingService, MarketConfig, MarketError, MarketStore, TradeService};

fn seller() -> Address {
    Address::new("0x1234567890abcdef1234567890abcdef12345678").expect("valid address")
}

fn buyer() -> Address {
    Address::new("0xabcdef1234567890abcdef1234567890abcdef12").expect("valid address")
}

fn delivery_listing() -> ListingDraft {
    ListingDraft {
        direction: ListingDirection::CryptoToCash,
        crypto_kind: CryptoKind::Lightning,
        crypto_amount: "0.01".parse().expect("amount"),
        cash_amount: Amount::from_whole(500),
        currency: "EUR".to_string(),
        settlement: SettlementMode::Delivery,
        location: None,
        description: None,
    }
}

fn services() -> (ListingService, TradeService) {
    let store = Arc::new(MarketStore::in_memory());
    let config = MarketConfig::default();
    (
        ListingService::new(store.clone(), config.clone()),
        TradeService::new(store, config),
    )
}

#[test]
fn concurrent_funding_has_exactly_one_winner() {
    let (listings, trades) = services();
    let listing = listings
        .create_listing(&seller(), delivery_listing())
        .expect("create listing");
    let tx = trades.open_trade(&listing.id, &buyer()).expect("open trade");

    let escrow_id = tx.escrow_id.clone();
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let trades = trades.clone();
            let escrow_id = escrow_id.clone();
            let caller = seller();
            std::thread::spawn(move || trades.fund_escrow(&escrow_id, &caller))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(MarketError::InvalidTransition { .. })))
        .count();

    assert_eq!(wins, 1, "exactly one fund call must win");
    assert_eq!(conflicts, 1, "the loser must see InvalidTransition");

    // The surviving state is the legal pair.
    let tx = trades.get_transaction(&tx.id).expect("transaction");
    let escrow = trades.get_escrow(&tx.escrow_id).expect("escrow");
    assert_eq!(tx.status, TransactionStatus::EscrowFunded);
    assert_eq!(escrow.status, EscrowStatus::Funded);
}

#[test]
fn concurrent_opens_claim_the_listing_once() {
    let (listings, trades) = services();
    let listing = listings
        .create_listing(&seller(), delivery_listing())
        .expect("create listing");

    let buyers = [
        buyer(),
        Address::new("0x7890abcdef1234567890abcdef1234567890abcd").expect("valid address"),
        Address::new("0x9999999999999999999999999999999999999999").expect("valid address"),
    ];

    let handles: Vec<_> = buyers
        .iter()
        .cloned()
        .map(|b| {
            let trades = trades.clone();
            let listing_id = listing.id.clone();
            std::thread::spawn(move || trades.open_trade(&listing_id, &b))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(MarketError::ListingBusy { .. })))
        .count();

    assert_eq!(wins, 1, "exactly one buyer may claim the listing");
    assert_eq!(busy, buyers.len() - 1);
}

#[test]
fn readers_never_observe_a_split_pair() {
    let (listings, trades) = services();
    let listing = listings
        .create_listing(&seller(), delivery_listing())
        .expect("create listing");
    let tx = trades.open_trade(&listing.id, &buyer()).expect("open trade");

    let tx_id = tx.id.clone();
    let reader = {
        let trades = trades.clone();
        std::thread::spawn(move || {
            for _ in 0..1000 {
                let tx = trades.get_transaction(&tx_id).expect("transaction");
                let escrow = trades.get_escrow(&tx.escrow_id).expect("escrow");
                let legal = matches!(
                    (escrow.status, tx.status),
                    (EscrowStatus::Pending, TransactionStatus::Pending)
                        | (EscrowStatus::Funded, TransactionStatus::EscrowFunded)
                        | (EscrowStatus::Funded, TransactionStatus::CashDelivered)
                        | (EscrowStatus::Released, TransactionStatus::Completed)
                );
                assert!(legal, "split pair: {} / {}", escrow.status, tx.status);
            }
        })
    };

    trades.fund_escrow(&tx.escrow_id, &seller()).expect("fund");
    trades
        .confirm_cash_delivered(&tx.id, &buyer())
        .expect("confirm");
    trades
        .release_escrow(&tx.escrow_id, &seller())
        .expect("release");

    reader.join().expect("reader thread");
}
