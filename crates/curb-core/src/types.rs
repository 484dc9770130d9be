//! Entity types and status transition tables for the marketplace.
//!
//! The transaction and escrow state machines are encoded here as pure
//! transition tables; the orchestration that applies them atomically lives
//! in `curb-market`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;
use crate::error::ValidationError;

/// Maximum length for a listing description.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Maximum length for a pickup location.
pub const MAX_LOCATION_LENGTH: usize = 120;

/// Regex for ISO-4217-shaped currency codes.
static CURRENCY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap_or_else(|_| unreachable!()));

/// The crypto asset kind on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptoKind {
    /// A dollar-pegged stablecoin.
    #[serde(rename = "STABLE_COIN")]
    StableCoin,
    /// Bitcoin over the Lightning Network.
    #[serde(rename = "LIGHTNING_NETWORK")]
    Lightning,
}

impl CryptoKind {
    /// Ticker symbol used in display formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::StableCoin => "USDC",
            Self::Lightning => "BTC",
        }
    }

    /// Display precision in fractional digits.
    #[must_use]
    pub const fn display_decimals(self) -> u32 {
        match self {
            Self::StableCoin => 2,
            Self::Lightning => 8,
        }
    }
}

/// How the cash leg settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementMode {
    /// Cash handed over in person at a named location.
    Pickup,
    /// Cash delivered to the counterparty.
    Delivery,
}

/// Which way the listing creator wants to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingDirection {
    /// Creator sells crypto for cash.
    CryptoToCash,
    /// Creator buys crypto with cash.
    CashToCrypto,
}

/// Whether a listing can still be traded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Open for new trades.
    Active,
    /// Retired; its trade reached a terminal state.
    Inactive,
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Trade opened, escrow not yet funded.
    Pending,
    /// Seller has locked the crypto leg in escrow.
    EscrowFunded,
    /// Buyer attests the cash was handed over.
    CashDelivered,
    /// Escrow released; trade done.
    Completed,
    /// Trade abandoned before completion.
    Cancelled,
    /// A party raised a dispute; escrow is held.
    Disputed,
}

impl TransactionStatus {
    /// Checks if a transition to the target status is valid.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use TransactionStatus::{
            Cancelled, CashDelivered, Completed, Disputed, EscrowFunded, Pending,
        };

        matches!(
            (self, target),
            (Pending, EscrowFunded)
                | (EscrowFunded, CashDelivered)
                | (CashDelivered, Completed)
                | (Pending | EscrowFunded | CashDelivered, Cancelled | Disputed)
        )
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Disputed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::EscrowFunded => "ESCROW_FUNDED",
            Self::CashDelivered => "CASH_DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of an escrow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    /// Created alongside its transaction, not yet funded.
    Pending,
    /// Crypto locked by the seller.
    Funded,
    /// Crypto handed to the buyer.
    Released,
    /// Crypto returned to the seller.
    Refunded,
}

impl EscrowStatus {
    /// Checks if a transition to the target status is valid.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use EscrowStatus::{Funded, Pending, Refunded, Released};

        matches!((self, target), (Pending, Funded) | (Funded, Released | Refunded))
    }

    /// Returns true if the escrow reached a terminal state.
    #[must_use]
    pub const fn is_finalized(self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Funded => "funded",
            Self::Released => "released",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// User-supplied terms for a new listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    /// Which way the creator wants to trade.
    pub direction: ListingDirection,
    /// Crypto asset kind.
    pub crypto_kind: CryptoKind,
    /// Crypto amount on offer.
    pub crypto_amount: Amount,
    /// Cash amount asked/offered.
    pub cash_amount: Amount,
    /// Cash currency code (three uppercase letters).
    pub currency: String,
    /// How cash changes hands.
    pub settlement: SettlementMode,
    /// Meeting place; required for pickup settlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ListingDraft {
    /// Validates the draft terms.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if an amount is zero, the currency
    /// code is malformed, a pickup listing has no location, or a text
    /// field exceeds its cap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.crypto_amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount {
                field: "crypto_amount",
            });
        }
        if self.cash_amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount {
                field: "cash_amount",
            });
        }
        if !CURRENCY_REGEX.is_match(&self.currency) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }

        match (&self.settlement, &self.location) {
            (SettlementMode::Pickup, None) => return Err(ValidationError::MissingLocation),
            (SettlementMode::Pickup, Some(loc)) if loc.trim().is_empty() => {
                return Err(ValidationError::MissingLocation);
            }
            _ => {}
        }

        if self
            .location
            .as_ref()
            .is_some_and(|loc| loc.len() > MAX_LOCATION_LENGTH)
        {
            return Err(ValidationError::FieldTooLong {
                field: "location",
                max: MAX_LOCATION_LENGTH,
            });
        }
        if self
            .description
            .as_ref()
            .is_some_and(|desc| desc.len() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(ValidationError::FieldTooLong {
                field: "description",
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        Ok(())
    }
}

/// A posted offer to exchange crypto for cash (or the reverse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing id.
    pub id: String,
    /// Wallet that posted the listing.
    pub created_by: Address,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Trade direction.
    pub direction: ListingDirection,
    /// Crypto asset kind.
    pub crypto_kind: CryptoKind,
    /// Crypto amount on offer.
    pub crypto_amount: Amount,
    /// Cash amount asked/offered.
    pub cash_amount: Amount,
    /// Cash currency code.
    pub currency: String,
    /// How cash changes hands.
    pub settlement: SettlementMode,
    /// Meeting place for pickup settlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the listing can still be traded against.
    pub status: ListingStatus,
}

impl Listing {
    /// Builds an active listing from validated draft terms.
    #[must_use]
    pub fn from_draft(
        id: String,
        created_by: Address,
        created_at: DateTime<Utc>,
        draft: ListingDraft,
    ) -> Self {
        Self {
            id,
            created_by,
            created_at,
            direction: draft.direction,
            crypto_kind: draft.crypto_kind,
            crypto_amount: draft.crypto_amount,
            cash_amount: draft.cash_amount,
            currency: draft.currency,
            settlement: draft.settlement,
            location: draft.location,
            description: draft.description,
            status: ListingStatus::Active,
        }
    }

    /// Returns true while the listing is open for trades.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ListingStatus::Active)
    }
}

/// A single trade against a listing, tracked through the escrow lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id.
    pub id: String,
    /// The listing this trade was opened against.
    pub listing_id: String,
    /// The listing creator; holds or receives the crypto leg.
    pub seller: Address,
    /// The trade initiator; hands over or receives the cash leg.
    pub buyer: Address,
    /// The paired escrow record.
    pub escrow_id: String,
    /// Crypto asset kind, copied from the listing.
    pub crypto_kind: CryptoKind,
    /// Crypto amount, copied from the listing.
    pub crypto_amount: Amount,
    /// Cash amount, copied from the listing.
    pub cash_amount: Amount,
    /// Cash currency, copied from the listing.
    pub currency: String,
    /// Settlement mode, copied from the listing.
    pub settlement: SettlementMode,
    /// Pickup location, copied from the listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status-change time.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Opens a pending trade against a listing, copying its terms.
    #[must_use]
    pub fn open(
        id: String,
        escrow_id: String,
        listing: &Listing,
        buyer: Address,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            listing_id: listing.id.clone(),
            seller: listing.created_by.clone(),
            buyer,
            escrow_id,
            crypto_kind: listing.crypto_kind,
            crypto_amount: listing.crypto_amount,
            cash_amount: listing.cash_amount,
            currency: listing.currency.clone(),
            settlement: listing.settlement,
            location: listing.location.clone(),
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the address is the buyer or the seller.
    #[must_use]
    pub fn involves(&self, address: &Address) -> bool {
        &self.buyer == address || &self.seller == address
    }
}

/// Custody record for the crypto leg of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    /// Unique escrow id.
    pub id: String,
    /// The owning transaction (1:1).
    pub transaction_id: String,
    /// Set when the seller funds the escrow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funded_at: Option<DateTime<Utc>>,
    /// Set when the escrow is released to the buyer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: EscrowStatus,
}

impl Escrow {
    /// Creates a pending escrow paired with a transaction.
    #[must_use]
    pub const fn new(id: String, transaction_id: String) -> Self {
        Self {
            id,
            transaction_id,
            funded_at: None,
            released_at: None,
            status: EscrowStatus::Pending,
        }
    }
}

/// Reputation record for a wallet, created lazily on first sight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Wallet identity.
    pub address: Address,
    /// Count of trades this wallet completed (either side).
    pub completed_transactions: u64,
    /// Reputation score; carried as data, no rating operation yet.
    pub rating: f32,
    /// First time this wallet was seen.
    pub joined_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a fresh profile for a newly seen address.
    #[must_use]
    pub const fn new(address: Address, joined_at: DateTime<Utc>) -> Self {
        Self {
            address,
            completed_transactions: 0,
            rating: 0.0,
            joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn seller() -> Address {
        Address::new("0x1234567890abcdef1234567890abcdef12345678").expect("valid address")
    }

    fn draft() -> ListingDraft {
        ListingDraft {
            direction: ListingDirection::CryptoToCash,
            crypto_kind: CryptoKind::StableCoin,
            crypto_amount: Amount::from_whole(1000),
            cash_amount: Amount::from_whole(950),
            currency: "USD".to_string(),
            settlement: SettlementMode::Pickup,
            location: Some("New York, NY".to_string()),
            description: Some("Selling USDC for cash.".to_string()),
        }
    }

    #[test]
    fn draft_valid_terms() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn draft_rejects_zero_amounts() {
        let mut d = draft();
        d.crypto_amount = Amount::ZERO;
        assert!(matches!(
            d.validate(),
            Err(ValidationError::NonPositiveAmount {
                field: "crypto_amount"
            })
        ));

        let mut d = draft();
        d.cash_amount = Amount::ZERO;
        assert!(matches!(
            d.validate(),
            Err(ValidationError::NonPositiveAmount {
                field: "cash_amount"
            })
        ));
    }

    #[test_case("usd")]
    #[test_case("US")]
    #[test_case("USDT")]
    #[test_case("")]
    fn draft_rejects_bad_currency(code: &str) {
        let mut d = draft();
        d.currency = code.to_string();
        assert!(matches!(
            d.validate(),
            Err(ValidationError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn draft_pickup_requires_location() {
        let mut d = draft();
        d.location = None;
        assert!(matches!(d.validate(), Err(ValidationError::MissingLocation)));

        let mut d = draft();
        d.location = Some("   ".to_string());
        assert!(matches!(d.validate(), Err(ValidationError::MissingLocation)));
    }

    #[test]
    fn draft_delivery_allows_missing_location() {
        let mut d = draft();
        d.settlement = SettlementMode::Delivery;
        d.location = None;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn draft_caps_text_fields() {
        let mut d = draft();
        d.description = Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1));
        assert!(matches!(
            d.validate(),
            Err(ValidationError::FieldTooLong {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn transaction_status_happy_path() {
        use TransactionStatus::{CashDelivered, Completed, EscrowFunded, Pending};

        assert!(Pending.can_transition_to(EscrowFunded));
        assert!(EscrowFunded.can_transition_to(CashDelivered));
        assert!(CashDelivered.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(CashDelivered));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!EscrowFunded.can_transition_to(Completed));
    }

    #[test_case(TransactionStatus::Pending)]
    #[test_case(TransactionStatus::EscrowFunded)]
    #[test_case(TransactionStatus::CashDelivered)]
    fn transaction_status_side_branches(from: TransactionStatus) {
        assert!(from.can_transition_to(TransactionStatus::Cancelled));
        assert!(from.can_transition_to(TransactionStatus::Disputed));
    }

    #[test_case(TransactionStatus::Completed)]
    #[test_case(TransactionStatus::Cancelled)]
    #[test_case(TransactionStatus::Disputed)]
    fn transaction_status_terminal_states_are_dead_ends(from: TransactionStatus) {
        assert!(from.is_terminal());
        for target in [
            TransactionStatus::Pending,
            TransactionStatus::EscrowFunded,
            TransactionStatus::CashDelivered,
            TransactionStatus::Completed,
            TransactionStatus::Cancelled,
            TransactionStatus::Disputed,
        ] {
            assert!(!from.can_transition_to(target));
        }
    }

    #[test]
    fn escrow_status_transitions() {
        use EscrowStatus::{Funded, Pending, Refunded, Released};

        assert!(Pending.can_transition_to(Funded));
        assert!(Funded.can_transition_to(Released));
        assert!(Funded.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Released));
        assert!(!Released.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Funded));

        assert!(Released.is_finalized());
        assert!(Refunded.is_finalized());
        assert!(!Funded.is_finalized());
    }

    #[test]
    fn listing_from_draft_is_active() {
        let l = Listing::from_draft("l-1".to_string(), seller(), Utc::now(), draft());
        assert!(l.is_active());
        assert_eq!(l.cash_amount, Amount::from_whole(950));
        assert_eq!(l.location.as_deref(), Some("New York, NY"));
    }

    #[test]
    fn transaction_copies_listing_terms() {
        let listing = Listing::from_draft("l-1".to_string(), seller(), Utc::now(), draft());
        let buyer =
            Address::new("0xabcdef1234567890abcdef1234567890abcdef12").expect("valid address");

        let tx = Transaction::open(
            "t-1".to_string(),
            "e-1".to_string(),
            &listing,
            buyer.clone(),
            Utc::now(),
        );

        assert_eq!(tx.seller, listing.created_by);
        assert_eq!(tx.buyer, buyer);
        assert_eq!(tx.crypto_amount, listing.crypto_amount);
        assert_eq!(tx.currency, listing.currency);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.involves(&buyer));
        assert!(tx.involves(&listing.created_by));
    }

    #[test]
    fn status_serde_wire_values() {
        let json = serde_json::to_string(&TransactionStatus::EscrowFunded).expect("serialize");
        assert_eq!(json, "\"ESCROW_FUNDED\"");

        let json = serde_json::to_string(&EscrowStatus::Funded).expect("serialize");
        assert_eq!(json, "\"funded\"");

        let json = serde_json::to_string(&CryptoKind::Lightning).expect("serialize");
        assert_eq!(json, "\"LIGHTNING_NETWORK\"");

        let json = serde_json::to_string(&ListingDirection::CryptoToCash).expect("serialize");
        assert_eq!(json, "\"CRYPTO_TO_CASH\"");
    }
}
