//! Offer operations: submit, accept, reject, expire, reclaim.

use estatemesh_ledger::PayoutRail;
use estatemesh_settlement::{SettlementLedgers, SettlementOutcome, Settler};
use estatemesh_types::{
    Amount, Identity, MarketError, MarketEvent, Offer, OfferOutcome, Payout, PropertyId, Result,
};

use crate::Marketplace;

impl<R: PayoutRail> Marketplace<R> {
    // =================================================================
    // Buyer operations
    // =================================================================

    /// Deposit `amount` into escrow as an offer on a listed property.
    /// `expires_in_seconds == 0` means the offer never expires.
    ///
    /// # Errors
    /// `NotListed`, `AuctionConflict` while an auction exists, `InvalidOffer`
    /// for a seller offer or zero amount, `DuplicateOffer`.
    pub fn submit_offer(
        &mut self,
        buyer: Identity,
        property_id: PropertyId,
        amount: Amount,
        expires_in_seconds: u64,
    ) -> Result<()> {
        self.transact(property_id, |m, now| {
            let property = m.registry.get(property_id)?;
            if !property.is_listed {
                return Err(MarketError::NotListed(property_id));
            }
            if property.has_auction() {
                return Err(MarketError::AuctionConflict {
                    property: property_id,
                    reason: "offers are closed while an auction exists".to_string(),
                });
            }
            if property.is_seller(buyer) {
                return Err(MarketError::InvalidOffer {
                    reason: "seller cannot submit an offer".to_string(),
                });
            }
            let offer = Offer::new(property_id, buyer, amount, now, expires_in_seconds)?;
            let max = m.config.max_offers_per_property;
            m.book.submit(&mut m.escrow, offer, max)?;

            tracing::info!(property = %property_id, buyer = %buyer, amount, "Offer submitted");
            m.emit(MarketEvent::OfferSubmitted {
                property_id,
                buyer,
                amount,
            });
            Ok(((), Vec::new()))
        })
    }

    /// [`Self::submit_offer`] with no expiry.
    pub fn submit_offer_simple(&mut self, buyer: Identity, property_id: PropertyId, amount: Amount) -> Result<()> {
        self.submit_offer(buyer, property_id, amount, 0)
    }

    /// Reclaim the caller's deposit from an offer that is no longer live:
    /// expired, or on a property that is no longer listed.
    ///
    /// # Errors
    /// `NothingToRefund` if the caller has no active offer here,
    /// `OfferStillLive` if the offer could still be accepted.
    pub fn refund_deposit(&mut self, caller: Identity, property_id: PropertyId) -> Result<Amount> {
        self.transact(property_id, |m, now| {
            let listed = m.registry.get(property_id)?.is_listed;
            let index = m
                .book
                .find_active(property_id, caller)
                .ok_or(MarketError::NothingToRefund(property_id))?;
            if listed && m.book.entry(property_id, index)?.is_live(now) {
                return Err(MarketError::OfferStillLive {
                    property: property_id,
                    buyer: caller,
                });
            }
            let payout = m
                .book
                .close_and_refund(&mut m.escrow, property_id, index, OfferOutcome::Reclaimed)?;
            let amount = payout.amount;

            tracing::info!(property = %property_id, buyer = %caller, amount, "Deposit reclaimed");
            m.emit(MarketEvent::DepositRefunded {
                property_id,
                buyer: caller,
                amount,
            });
            Ok((amount, vec![payout]))
        })
    }

    /// Refund every offer on the property whose expiry has passed. Any
    /// identity may call. Returns the number of offers expired.
    pub fn expire_offers(&mut self, _caller: Identity, property_id: PropertyId) -> Result<usize> {
        self.transact(property_id, |m, now| {
            m.registry.get(property_id)?;
            let mut payouts = Vec::new();
            for index in m.book.expired_indices(property_id, now) {
                let payout =
                    m.book
                        .close_and_refund(&mut m.escrow, property_id, index, OfferOutcome::Expired)?;
                m.emit(MarketEvent::OfferExpired {
                    property_id,
                    buyer: payout.recipient,
                    amount: payout.amount,
                });
                payouts.push(payout);
            }
            if !payouts.is_empty() {
                tracing::info!(property = %property_id, expired = payouts.len(), "Offers expired");
            }
            Ok((payouts.len(), payouts))
        })
    }

    // =================================================================
    // Seller operations
    // =================================================================

    /// Accept `buyer`'s active offer and settle the sale.
    ///
    /// # Errors
    /// `Unauthorized`, `AuctionConflict`, `OfferNotFound`, `OfferExpired`,
    /// plus every settlement gate error.
    pub fn accept_offer(&mut self, caller: Identity, property_id: PropertyId, buyer: Identity) -> Result<SettlementOutcome> {
        self.transact(property_id, |m, now| {
            m.require_offer_window(caller, property_id)?;
            let index = m
                .book
                .find_active(property_id, buyer)
                .ok_or(MarketError::OfferNotFound {
                    property: property_id,
                    buyer,
                })?;
            if m.book.entry(property_id, index)?.is_expired(now) {
                return Err(MarketError::OfferExpired {
                    property: property_id,
                    buyer,
                });
            }
            let outcome = m.settle(property_id, index)?;
            m.emit(MarketEvent::OfferAccepted {
                property_id,
                buyer,
                amount: outcome.amount,
            });
            m.emit_completed(&outcome);
            let payouts = outcome.payouts.clone();
            Ok((outcome, payouts))
        })
    }

    /// Accept the earliest submitted offer that is active and unexpired.
    ///
    /// # Errors
    /// `NoActiveOffers` if none qualifies, plus as [`Self::accept_offer`].
    pub fn accept_first_offer(&mut self, caller: Identity, property_id: PropertyId) -> Result<SettlementOutcome> {
        self.transact(property_id, |m, now| {
            m.require_offer_window(caller, property_id)?;
            let index = m
                .book
                .first_live(property_id, now)
                .ok_or(MarketError::NoActiveOffers(property_id))?;
            let outcome = m.settle(property_id, index)?;
            m.emit(MarketEvent::OfferAccepted {
                property_id,
                buyer: outcome.buyer,
                amount: outcome.amount,
            });
            m.emit_completed(&outcome);
            let payouts = outcome.payouts.clone();
            Ok((outcome, payouts))
        })
    }

    /// Reject `buyer`'s active offer and refund it.
    ///
    /// # Errors
    /// `Unauthorized`, `OfferNotFound`, `AuctionConflict` for auction bids.
    pub fn reject_offer(&mut self, caller: Identity, property_id: PropertyId, buyer: Identity) -> Result<()> {
        self.transact(property_id, |m, _| {
            m.registry.require_seller(caller, property_id)?;
            let index = m
                .book
                .find_active(property_id, buyer)
                .ok_or(MarketError::OfferNotFound {
                    property: property_id,
                    buyer,
                })?;
            m.reject_at(property_id, index).map(|payout| ((), vec![payout]))
        })
    }

    /// Reject the earliest submitted active offer.
    ///
    /// # Errors
    /// `Unauthorized`, `NoActiveOffers`.
    pub fn reject_first_offer(&mut self, caller: Identity, property_id: PropertyId) -> Result<Identity> {
        self.transact(property_id, |m, _| {
            m.registry.require_seller(caller, property_id)?;
            let index = m
                .book
                .offers(property_id)
                .iter()
                .position(|o| o.is_active && !o.is_bid)
                .ok_or(MarketError::NoActiveOffers(property_id))?;
            let payout = m.reject_at(property_id, index)?;
            Ok((payout.recipient, vec![payout]))
        })
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Full offer history for a property, closed entries included.
    ///
    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_property_offers(&self, property_id: PropertyId) -> Result<&[Offer]> {
        self.registry.get(property_id)?;
        Ok(self.book.offers(property_id))
    }

    /// Active offers and bids, in submission order.
    ///
    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_active_offers(&self, property_id: PropertyId) -> Result<Vec<Offer>> {
        self.registry.get(property_id)?;
        Ok(self.book.active(property_id).cloned().collect())
    }

    // =================================================================
    // Internals
    // =================================================================

    /// Seller-only, and no auction on the property.
    fn require_offer_window(&mut self, caller: Identity, property_id: PropertyId) -> Result<()> {
        let property = self.registry.require_seller(caller, property_id)?;
        if property.has_auction() {
            return Err(MarketError::AuctionConflict {
                property: property_id,
                reason: "end the auction to settle".to_string(),
            });
        }
        Ok(())
    }

    fn reject_at(&mut self, property_id: PropertyId, index: usize) -> Result<Payout> {
        if self.book.entry(property_id, index)?.is_bid {
            return Err(MarketError::AuctionConflict {
                property: property_id,
                reason: "auction bids cannot be rejected".to_string(),
            });
        }
        let payout = self
            .book
            .close_and_refund(&mut self.escrow, property_id, index, OfferOutcome::Rejected)?;
        tracing::info!(property = %property_id, buyer = %payout.recipient, "Offer rejected");
        self.emit(MarketEvent::OfferRejected {
            property_id,
            buyer: payout.recipient,
        });
        Ok(payout)
    }

    /// Settle the sale to the offer at `index` with the current fee.
    pub(crate) fn settle(&mut self, property_id: PropertyId, index: usize) -> Result<SettlementOutcome> {
        let settler = Settler::new(self.access.owner(), self.platform_fee);
        let property = self.registry.get_mut(property_id)?;
        settler.settle(
            property,
            SettlementLedgers {
                book: &mut self.book,
                escrow: &mut self.escrow,
                titles: &mut self.titles,
                guard: &mut self.guard,
            },
            index,
        )
    }

    pub(crate) fn emit_completed(&mut self, outcome: &SettlementOutcome) {
        self.emit(MarketEvent::TransactionCompleted {
            property_id: outcome.property_id,
            seller: outcome.seller,
            buyer: outcome.buyer,
            amount: outcome.amount,
            platform_cut: outcome.split.platform_cut,
            agent_cut: outcome.split.agent_cut,
            seller_proceeds: outcome.split.seller_proceeds,
        });
    }
}

