//! Auction subsystem: an optional bidding window over the offer book.
//!
//! Bids are ordinary offer-book entries flagged `is_bid`; the property
//! record tracks the window and the current leader. A new leader is only
//! recorded after the displaced leader has been refunded.
//!
//! ```text
//! start ──▶ [bidding: now < end] ──(now ≥ end)──▶ conclude ──▶ settle | clear
//! ```

use estatemesh_ledger::EscrowLedger;
use estatemesh_types::{Amount, Identity, MarketError, Offer, OfferOutcome, Payout, Property, Result, Timestamp};

use crate::offer_book::OfferBook;

/// Open a bidding window on a listed property.
///
/// # Errors
/// `NotListed`, `AuctionConflict` if an auction already exists,
/// `InvalidAuction` for a zero minimum or duration.
pub fn start(property: &mut Property, minimum_bid: Amount, duration_seconds: u64, now: Timestamp) -> Result<Timestamp> {
    if !property.is_listed {
        return Err(MarketError::NotListed(property.id));
    }
    if property.has_auction() {
        return Err(MarketError::AuctionConflict {
            property: property.id,
            reason: "an auction already exists".to_string(),
        });
    }
    if minimum_bid == 0 {
        return Err(MarketError::InvalidAuction {
            reason: "minimum bid must be positive".to_string(),
        });
    }
    if duration_seconds == 0 {
        return Err(MarketError::InvalidAuction {
            reason: "duration must be positive".to_string(),
        });
    }
    let end_time = now
        .checked_add(duration_seconds)
        .ok_or_else(|| MarketError::InvalidAuction {
            reason: format!("duration {duration_seconds}s overflows the clock"),
        })?;

    property.clear_auction();
    property.minimum_bid = minimum_bid;
    property.auction_end_time = end_time;
    tracing::info!(property = %property.id, minimum_bid, end_time, "Auction started");
    Ok(end_time)
}

/// Place a bid. Refunds the displaced leader (outcome `Outbid`) before the
/// new bid is deposited and recorded. Returns the outbid refund, if any.
///
/// # Errors
/// `NotListed`, `InvalidAuction` outside the bidding window,
/// `InvalidOffer` for a seller bid, `BidTooLow`, `DuplicateOffer` if the
/// bidder holds an unrelated active offer. Offer book and escrow are left
/// untouched on every validation failure.
pub fn place_bid(
    property: &mut Property,
    book: &mut OfferBook,
    escrow: &mut EscrowLedger,
    bidder: Identity,
    value: Amount,
    now: Timestamp,
    max_offers: usize,
) -> Result<Option<Payout>> {
    let id = property.id;
    if !property.is_listed {
        return Err(MarketError::NotListed(id));
    }
    if !property.is_auction_active(now) {
        return Err(MarketError::InvalidAuction {
            reason: format!("bidding window on {id} is not open"),
        });
    }
    if property.is_seller(bidder) {
        return Err(MarketError::InvalidOffer {
            reason: "seller cannot bid on own property".to_string(),
        });
    }
    if value < property.minimum_bid || value <= property.highest_bid {
        return Err(MarketError::BidTooLow {
            value,
            minimum: property.minimum_bid,
            highest: property.highest_bid,
        });
    }

    let leader_index = property
        .highest_bidder
        .and_then(|leader| book.find_active(id, leader));
    if let Some(existing) = book.find_active(id, bidder) {
        if Some(existing) != leader_index {
            return Err(MarketError::DuplicateOffer { property: id, buyer: bidder });
        }
    }
    // The outbid leader's slot is freed before the new bid lands.
    let active_after_refund = book.active(id).count() - usize::from(leader_index.is_some());
    if active_after_refund >= max_offers {
        return Err(MarketError::InvalidOffer {
            reason: format!("offer book for {id} is full ({max_offers} active entries)"),
        });
    }
    let bid = Offer::bid(id, bidder, value, now)?;

    let outbid = match leader_index {
        Some(index) => Some(book.close_and_refund(escrow, id, index, OfferOutcome::Outbid)?),
        None => None,
    };
    book.submit(escrow, bid, max_offers)?;

    property.highest_bid = value;
    property.highest_bidder = Some(bidder);
    property.bid_count = property.bid_count.saturating_add(1);
    tracing::debug!(property = %id, bidder = %bidder, value, bids = property.bid_count, "Bid placed");
    Ok(outbid)
}

/// Close the bidding window. Returns the winner and winning amount, or
/// `None` if nobody bid. Auction fields are left for the caller to clear
/// (settlement clears them on success).
///
/// # Errors
/// `AuctionConflict` if there is no auction, `InvalidAuction` if the
/// window is still open.
pub fn conclude(property: &Property, now: Timestamp) -> Result<Option<(Identity, Amount)>> {
    if !property.has_auction() {
        return Err(MarketError::AuctionConflict {
            property: property.id,
            reason: "no auction to end".to_string(),
        });
    }
    if now < property.auction_end_time {
        return Err(MarketError::InvalidAuction {
            reason: format!("auction on {} runs until {}", property.id, property.auction_end_time),
        });
    }
    Ok(property.highest_bidder.map(|winner| (winner, property.highest_bid)))
}

#[cfg(test)]
mod tests {
    use estatemesh_types::PropertyId;

    use super::*;

    const MAX: usize = 64;

    fn listed() -> Property {
        Property::dummy(PropertyId(0), Identity::new(), 1_000)
    }

    #[test]
    fn start_sets_window() {
        let mut p = listed();
        let end = start(&mut p, 100, 3_600, 1_000).unwrap();
        assert_eq!(end, 4_600);
        assert_eq!(p.minimum_bid, 100);
        assert!(p.is_auction_active(4_599));
        assert!(!p.is_auction_active(4_600));
    }

    #[test]
    fn start_rejects_bad_parameters() {
        let mut p = listed();
        assert!(matches!(start(&mut p, 0, 10, 0), Err(MarketError::InvalidAuction { .. })));
        assert!(matches!(start(&mut p, 10, 0, 0), Err(MarketError::InvalidAuction { .. })));
        start(&mut p, 10, 10, 0).unwrap();
        assert!(matches!(start(&mut p, 10, 10, 0), Err(MarketError::AuctionConflict { .. })));

        let mut unlisted = listed();
        unlisted.is_listed = false;
        assert!(matches!(start(&mut unlisted, 10, 10, 0), Err(MarketError::NotListed(_))));
    }

    #[test]
    fn outbid_leader_is_refunded_first() {
        let mut p = listed();
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        let (alice, bob) = (Identity::new(), Identity::new());
        start(&mut p, 100, 60, 0).unwrap();

        assert!(place_bid(&mut p, &mut book, &mut escrow, alice, 150, 1, MAX).unwrap().is_none());
        let refund = place_bid(&mut p, &mut book, &mut escrow, bob, 200, 2, MAX)
            .unwrap()
            .unwrap();

        assert_eq!(refund.recipient, alice);
        assert_eq!(refund.amount, 150);
        assert_eq!(escrow.balance(p.id), 200);
        assert_eq!(p.highest_bidder, Some(bob));
        assert_eq!(p.bid_count, 2);
        assert_eq!(book.offers(p.id)[0].outcome, Some(OfferOutcome::Outbid));
    }

    #[test]
    fn leader_may_raise_own_bid() {
        let mut p = listed();
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        let alice = Identity::new();
        start(&mut p, 100, 60, 0).unwrap();

        place_bid(&mut p, &mut book, &mut escrow, alice, 150, 1, MAX).unwrap();
        let refund = place_bid(&mut p, &mut book, &mut escrow, alice, 180, 2, MAX)
            .unwrap()
            .unwrap();
        assert_eq!(refund.amount, 150);
        assert_eq!(escrow.balance(p.id), 180);
        assert_eq!(book.active(p.id).count(), 1);
    }

    #[test]
    fn low_bids_rejected_without_state_change() {
        let mut p = listed();
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        start(&mut p, 100, 60, 0).unwrap();

        let err = place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 99, 1, MAX).unwrap_err();
        assert!(matches!(err, MarketError::BidTooLow { minimum: 100, .. }));

        place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 150, 1, MAX).unwrap();
        let err = place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 150, 2, MAX).unwrap_err();
        assert!(matches!(err, MarketError::BidTooLow { highest: 150, .. }));
        assert_eq!(escrow.balance(p.id), 150);
        assert_eq!(p.bid_count, 1);
    }

    #[test]
    fn seller_and_late_bids_rejected() {
        let mut p = listed();
        let seller = p.seller;
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        start(&mut p, 100, 60, 0).unwrap();

        let err = place_bid(&mut p, &mut book, &mut escrow, seller, 150, 1, MAX).unwrap_err();
        assert!(matches!(err, MarketError::InvalidOffer { .. }));

        let err = place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 150, 60, MAX).unwrap_err();
        assert!(matches!(err, MarketError::InvalidAuction { .. }));
        assert_eq!(escrow.balance(p.id), 0);
    }

    #[test]
    fn repeated_self_raises_leave_room_for_rivals() {
        let mut p = listed();
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        let (churner, rival) = (Identity::new(), Identity::new());
        start(&mut p, 10, 60, 0).unwrap();

        for value in 10..20 {
            place_bid(&mut p, &mut book, &mut escrow, churner, value, 1, 3).unwrap();
        }
        assert_eq!(book.offers(p.id).len(), 10);
        assert_eq!(book.active(p.id).count(), 1);

        let refund = place_bid(&mut p, &mut book, &mut escrow, rival, 1_000_000, 2, 3)
            .unwrap()
            .unwrap();
        assert_eq!(refund.recipient, churner);
        assert_eq!(p.highest_bidder, Some(rival));
        assert_eq!(escrow.balance(p.id), 1_000_000);
    }

    #[test]
    fn single_slot_book_still_accepts_outbidding() {
        let mut p = listed();
        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        start(&mut p, 10, 60, 0).unwrap();

        place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 10, 1, 1).unwrap();
        place_bid(&mut p, &mut book, &mut escrow, Identity::new(), 20, 2, 1).unwrap();
        assert_eq!(book.active(p.id).count(), 1);
        assert_eq!(escrow.balance(p.id), 20);
    }

    #[test]
    fn conclude_respects_window() {
        let mut p = listed();
        assert!(matches!(conclude(&p, 0), Err(MarketError::AuctionConflict { .. })));

        start(&mut p, 100, 60, 0).unwrap();
        assert!(matches!(conclude(&p, 59), Err(MarketError::InvalidAuction { .. })));
        assert_eq!(conclude(&p, 60).unwrap(), None);

        let mut book = OfferBook::new();
        let mut escrow = EscrowLedger::new();
        let alice = Identity::new();
        place_bid(&mut p, &mut book, &mut escrow, alice, 120, 10, MAX).unwrap();
        assert_eq!(conclude(&p, 60).unwrap(), Some((alice, 120)));
    }
}
