//! Display helpers for read models.
//!
//! Pure presentation lookups consumed by the API layer and any UI; nothing
//! here touches state.

use crate::amount::Amount;
use crate::types::{CryptoKind, ListingDirection, TransactionStatus};

/// Renders a crypto amount with its ticker, e.g. `1000.00 USDC`.
#[must_use]
pub fn format_crypto(amount: Amount, kind: CryptoKind) -> String {
    format!(
        "{} {}",
        amount.to_decimal_string(kind.display_decimals()),
        kind.symbol()
    )
}

/// Renders a cash amount with its currency code, e.g. `950.00 USD`.
#[must_use]
pub fn format_cash(amount: Amount, currency: &str) -> String {
    format!("{} {currency}", amount.to_decimal_string(2))
}

/// Human-readable label for a listing direction.
#[must_use]
pub const fn listing_direction_label(direction: ListingDirection) -> &'static str {
    match direction {
        ListingDirection::CryptoToCash => "Sell Crypto for Cash",
        ListingDirection::CashToCrypto => "Buy Crypto with Cash",
    }
}

/// Human-readable label for a transaction status.
#[must_use]
pub const fn transaction_status_label(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "Pending",
        TransactionStatus::EscrowFunded => "Escrow Funded",
        TransactionStatus::CashDelivered => "Cash Delivered",
        TransactionStatus::Completed => "Completed",
        TransactionStatus::Cancelled => "Cancelled",
        TransactionStatus::Disputed => "Disputed",
    }
}
