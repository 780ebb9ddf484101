//! Offer model: escrow-backed purchase intents and auction bids.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  settlement             ┌──────────┐
//!   │ ACTIVE ├────────────────────────▶│ ACCEPTED │
//!   └───┬────┘                         └──────────┘
//!       │ reject / expire / outbid /
//!       │ cancel / reclaim / drain
//!       ▼
//!   ┌────────────────────────────┐
//!   │ CLOSED (funds returned or  │
//!   │ drained, outcome recorded) │
//!   └────────────────────────────┘
//! ```
//!
//! Every active offer has exactly its `amount` held in the property's escrow.
//! Closing an offer is irreversible.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, MarketError, PropertyId, Result, Timestamp};

/// Why an offer stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferOutcome {
    /// Won the sale; escrow paid out to seller, agent and platform.
    Accepted,
    /// Seller rejected it; refunded.
    Rejected,
    /// Passed its expiry; refunded.
    Expired,
    /// Displaced by a higher auction bid; refunded.
    Outbid,
    /// Property delisted or sold to someone else; refunded.
    Cancelled,
    /// Buyer reclaimed the deposit themselves; refunded.
    Reclaimed,
    /// Owner emergency withdrawal; escrow paid to the owner.
    Drained,
}

impl OfferOutcome {
    /// Whether the buyer got their deposit back.
    #[must_use]
    pub fn is_refund(self) -> bool {
        !matches!(self, Self::Accepted | Self::Drained)
    }
}

impl std::fmt::Display for OfferOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Outbid => write!(f, "OUTBID"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Reclaimed => write!(f, "RECLAIMED"),
            Self::Drained => write!(f, "DRAINED"),
        }
    }
}

/// An escrow-backed offer (or auction bid) on a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub property_id: PropertyId,
    pub buyer: Identity,
    pub amount: Amount,
    pub created_at: Timestamp,
    /// `0` means the offer never expires.
    pub expires_at: Timestamp,
    pub is_active: bool,
    /// Entered through the auction rather than `submitOffer`.
    pub is_bid: bool,
    /// Set once the offer is closed.
    pub outcome: Option<OfferOutcome>,
}

impl Offer {
    /// A new active offer.
    ///
    /// # Errors
    /// Returns `InvalidOffer` if `amount` is zero or the expiry overflows.
    pub fn new(
        property_id: PropertyId,
        buyer: Identity,
        amount: Amount,
        now: Timestamp,
        expires_in_seconds: u64,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(MarketError::InvalidOffer {
                reason: "deposit required: amount must be positive".to_string(),
            });
        }
        let expires_at = if expires_in_seconds == 0 {
            0
        } else {
            now.checked_add(expires_in_seconds)
                .ok_or_else(|| MarketError::InvalidOffer {
                    reason: format!("expiry {expires_in_seconds}s overflows the clock"),
                })?
        };
        Ok(Self {
            property_id,
            buyer,
            amount,
            created_at: now,
            expires_at,
            is_active: true,
            is_bid: false,
            outcome: None,
        })
    }

    /// A new active auction bid. Bids never expire on their own; the
    /// auction window governs them.
    ///
    /// # Errors
    /// Returns `InvalidOffer` if `amount` is zero.
    pub fn bid(property_id: PropertyId, bidder: Identity, amount: Amount, now: Timestamp) -> Result<Self> {
        let mut offer = Self::new(property_id, bidder, amount, now, 0)?;
        offer.is_bid = true;
        Ok(offer)
    }

    /// Past its expiry (offers with `expires_at == 0` never expire).
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at != 0 && now >= self.expires_at
    }

    /// Active and not expired, so eligible for acceptance.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Close an active offer with the given outcome.
    ///
    /// # Errors
    /// Returns `IllegalState` if the offer is already closed.
    pub fn close(&mut self, outcome: OfferOutcome) -> Result<()> {
        if !self.is_active {
            return Err(MarketError::illegal_state(format!(
                "offer from {} on {} already closed ({})",
                self.buyer,
                self.property_id,
                self.outcome.map_or_else(|| "unknown".to_string(), |o| o.to_string()),
            )));
        }
        self.is_active = false;
        self.outcome = Some(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_rejected() {
        let err = Offer::new(PropertyId(0), Identity::new(), 0, 10, 0).unwrap_err();
        assert!(matches!(err, MarketError::InvalidOffer { .. }));
    }

    #[test]
    fn expiry_is_relative_to_now() {
        let offer = Offer::new(PropertyId(0), Identity::new(), 5, 1_000, 60).unwrap();
        assert_eq!(offer.expires_at, 1_060);
        assert!(!offer.is_expired(1_059));
        assert!(offer.is_expired(1_060));
        assert!(offer.is_live(1_059));
        assert!(!offer.is_live(1_060));
    }

    #[test]
    fn zero_expiry_never_expires() {
        let offer = Offer::new(PropertyId(0), Identity::new(), 5, 1_000, 0).unwrap();
        assert_eq!(offer.expires_at, 0);
        assert!(!offer.is_expired(u64::MAX));
    }

    #[test]
    fn close_is_irreversible() {
        let mut offer = Offer::bid(PropertyId(0), Identity::new(), 5, 0).unwrap();
        assert!(offer.is_bid);
        offer.close(OfferOutcome::Outbid).unwrap();
        assert!(!offer.is_active);
        assert_eq!(offer.outcome, Some(OfferOutcome::Outbid));
        assert!(offer.close(OfferOutcome::Accepted).is_err());
    }

    #[test]
    fn refund_outcomes() {
        assert!(OfferOutcome::Rejected.is_refund());
        assert!(OfferOutcome::Outbid.is_refund());
        assert!(!OfferOutcome::Accepted.is_refund());
        assert!(!OfferOutcome::Drained.is_refund());
    }
}
