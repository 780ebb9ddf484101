//! Auction operations.

use estatemesh_ledger::PayoutRail;
use estatemesh_offers::auction;
use estatemesh_settlement::SettlementOutcome;
use estatemesh_types::{Amount, AuctionDetails, Identity, MarketError, MarketEvent, PropertyId, Result, Timestamp};

use crate::Marketplace;

impl<R: PayoutRail> Marketplace<R> {
    /// Open a bidding window of `duration_seconds` from now. Seller-only.
    /// Returns the auction end time.
    ///
    /// # Errors
    /// `Unauthorized`, `AlreadySold`, `NotListed`, `AuctionConflict`,
    /// `InvalidAuction`.
    pub fn start_auction(
        &mut self,
        caller: Identity,
        property_id: PropertyId,
        minimum_bid: Amount,
        duration_seconds: u64,
    ) -> Result<Timestamp> {
        self.transact(property_id, |m, now| {
            let property = m.registry.require_seller(caller, property_id)?;
            if property.is_sold {
                return Err(MarketError::AlreadySold(property_id));
            }
            let end_time = auction::start(property, minimum_bid, duration_seconds, now)?;
            m.emit(MarketEvent::AuctionStarted {
                property_id,
                minimum_bid,
                end_time,
            });
            Ok((end_time, Vec::new()))
        })
    }

    /// Bid `value` on an open auction. The displaced leader is refunded
    /// before the new bid is recorded.
    ///
    /// # Errors
    /// `NotListed`, `AuctionConflict` outside the window, `InvalidOffer`
    /// for a seller bid, `BidTooLow`, `DuplicateOffer`.
    pub fn bid_on_auction(&mut self, bidder: Identity, property_id: PropertyId, value: Amount) -> Result<()> {
        self.transact(property_id, |m, now| {
            let max = m.config.max_offers_per_property;
            let property = m.registry.get_mut(property_id)?;
            let outbid = auction::place_bid(property, &mut m.book, &mut m.escrow, bidder, value, now, max)?;
            m.emit(MarketEvent::OfferSubmitted {
                property_id,
                buyer: bidder,
                amount: value,
            });
            Ok(((), outbid.into_iter().collect()))
        })
    }

    /// Close a finished auction. With a leader, the sale settles to the
    /// winning bid; without one, auction state is cleared and nothing moves.
    /// Seller-only.
    ///
    /// # Errors
    /// `Unauthorized`, `AuctionConflict` if there is no auction or it is
    /// still running, plus every settlement gate error.
    pub fn end_auction(&mut self, caller: Identity, property_id: PropertyId) -> Result<Option<SettlementOutcome>> {
        self.transact(property_id, |m, now| {
            let property = m.registry.require_seller(caller, property_id)?;
            let Some((winner, amount)) = auction::conclude(property, now)? else {
                property.clear_auction();
                tracing::info!(property = %property_id, "Auction ended without bids");
                m.emit(MarketEvent::AuctionEnded {
                    property_id,
                    winner: None,
                    amount: 0,
                });
                return Ok((None, Vec::new()));
            };

            let index = m.book.find_active(property_id, winner).ok_or_else(|| {
                MarketError::illegal_state(format!(
                    "winning bid from {winner} on {property_id} is not held"
                ))
            })?;
            let outcome = m.settle(property_id, index)?;
            tracing::info!(property = %property_id, winner = %winner, amount, "Auction ended");
            m.emit(MarketEvent::AuctionEnded {
                property_id,
                winner: Some(winner),
                amount,
            });
            m.emit_completed(&outcome);
            let payouts = outcome.payouts.clone();
            Ok((Some(outcome), payouts))
        })
    }

    // =================================================================
    // Queries
    // =================================================================

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn is_auction_active(&self, property_id: PropertyId) -> Result<bool> {
        Ok(self.registry.get(property_id)?.is_auction_active(self.now()))
    }

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_auction_details(&self, property_id: PropertyId) -> Result<AuctionDetails> {
        Ok(AuctionDetails::of(self.registry.get(property_id)?, self.now()))
    }

    /// Current leader and leading amount.
    ///
    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_highest_bid(&self, property_id: PropertyId) -> Result<(Option<Identity>, Amount)> {
        let property = self.registry.get(property_id)?;
        Ok((property.highest_bidder, property.highest_bid))
    }
}
