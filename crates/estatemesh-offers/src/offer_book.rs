//! Per-property offer book.
//!
//! Each property keeps its offers in submission order, closed entries
//! included, so `getPropertyOffers` returns the full history. Only active
//! entries have funds in escrow; the book keeps
//! `escrow.balance(id) == Σ active amounts` by pairing every open with a
//! deposit and every refunding close with a refund.

use std::collections::HashMap;

use estatemesh_ledger::EscrowLedger;
use estatemesh_types::{
    Amount, Identity, MarketError, Offer, OfferOutcome, Payout, PropertyId, Result, Timestamp,
};

/// Offers for every property, in submission order.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    books: HashMap<PropertyId, Vec<Offer>>,
}

impl OfferBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Check an offer could be appended without touching any state.
    ///
    /// # Errors
    /// `DuplicateOffer` if the buyer already has an active offer here,
    /// `InvalidOffer` if the property already carries `max_offers` active
    /// entries. Closed entries never count against the cap.
    pub fn check_admissible(
        &self,
        property_id: PropertyId,
        buyer: Identity,
        max_offers: usize,
    ) -> Result<()> {
        if self.find_active(property_id, buyer).is_some() {
            return Err(MarketError::DuplicateOffer {
                property: property_id,
                buyer,
            });
        }
        if self.active(property_id).count() >= max_offers {
            return Err(MarketError::InvalidOffer {
                reason: format!("offer book for {property_id} is full ({max_offers} active entries)"),
            });
        }
        Ok(())
    }

    /// Deposit the offer's amount into escrow and append it. Returns its
    /// index in the property's book.
    ///
    /// # Errors
    /// As [`Self::check_admissible`], plus escrow deposit errors. Nothing
    /// changes on error.
    pub fn submit(&mut self, escrow: &mut EscrowLedger, offer: Offer, max_offers: usize) -> Result<usize> {
        if !offer.is_active {
            return Err(MarketError::illegal_state("cannot submit a closed offer"));
        }
        self.check_admissible(offer.property_id, offer.buyer, max_offers)?;
        escrow.deposit(offer.property_id, offer.amount)?;

        let book = self.books.entry(offer.property_id).or_default();
        book.push(offer);
        Ok(book.len() - 1)
    }

    // =================================================================
    // Closing
    // =================================================================

    /// Close an offer without moving funds. Used when escrow for the offer is
    /// paid out elsewhere (settlement, emergency drain).
    ///
    /// # Errors
    /// `IllegalState` if the index is unknown or the offer is already closed.
    pub fn close(&mut self, property_id: PropertyId, index: usize, outcome: OfferOutcome) -> Result<Offer> {
        let offer = self.entry_mut(property_id, index)?;
        offer.close(outcome)?;
        Ok(offer.clone())
    }

    /// Close an offer and refund its amount to the buyer.
    ///
    /// # Errors
    /// As [`Self::close`], plus `InsufficientEscrow` if the property's
    /// escrow cannot cover the refund.
    pub fn close_and_refund(
        &mut self,
        escrow: &mut EscrowLedger,
        property_id: PropertyId,
        index: usize,
        outcome: OfferOutcome,
    ) -> Result<Payout> {
        let offer = self.entry_mut(property_id, index)?;
        if !offer.is_active {
            return Err(MarketError::illegal_state(format!(
                "offer #{index} on {property_id} already closed"
            )));
        }
        let payout = escrow.refund(property_id, offer.amount, offer.buyer)?;
        offer.close(outcome)?;
        tracing::debug!(
            property = %property_id,
            buyer = %offer.buyer,
            amount = offer.amount,
            outcome = %outcome,
            "Offer closed with refund"
        );
        Ok(payout)
    }

    /// Refund every active offer on a property, closing each with `outcome`.
    /// Returns the closed offers alongside their refunds, in book order.
    ///
    /// # Errors
    /// Escrow errors from the first refund that fails; earlier refunds in
    /// the call are not undone.
    pub fn refund_all_active(
        &mut self,
        escrow: &mut EscrowLedger,
        property_id: PropertyId,
        outcome: OfferOutcome,
    ) -> Result<Vec<(Offer, Payout)>> {
        let indices = self.active_indices(property_id);
        let mut closed = Vec::with_capacity(indices.len());
        for index in indices {
            let payout = self.close_and_refund(escrow, property_id, index, outcome)?;
            closed.push((self.entry(property_id, index)?.clone(), payout));
        }
        Ok(closed)
    }

    /// Close every active offer without refunding. Returns the closed offers.
    ///
    /// # Errors
    /// Never in practice; closing an active entry cannot fail.
    pub fn close_all_active(&mut self, property_id: PropertyId, outcome: OfferOutcome) -> Result<Vec<Offer>> {
        self.active_indices(property_id)
            .into_iter()
            .map(|index| self.close(property_id, index, outcome))
            .collect()
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Full history for a property, in submission order.
    #[must_use]
    pub fn offers(&self, property_id: PropertyId) -> &[Offer] {
        self.books.get(&property_id).map_or(&[], Vec::as_slice)
    }

    /// Active offers for a property, in submission order.
    pub fn active(&self, property_id: PropertyId) -> impl Iterator<Item = &Offer> {
        self.offers(property_id).iter().filter(|o| o.is_active)
    }

    /// Index of `buyer`'s active offer, if any.
    #[must_use]
    pub fn find_active(&self, property_id: PropertyId, buyer: Identity) -> Option<usize> {
        self.offers(property_id)
            .iter()
            .position(|o| o.is_active && o.buyer == buyer)
    }

    /// Index of the earliest submitted offer that is active and unexpired.
    #[must_use]
    pub fn first_live(&self, property_id: PropertyId, now: Timestamp) -> Option<usize> {
        self.offers(property_id).iter().position(|o| o.is_live(now))
    }

    /// Indices of active offers whose expiry has passed.
    #[must_use]
    pub fn expired_indices(&self, property_id: PropertyId, now: Timestamp) -> Vec<usize> {
        self.offers(property_id)
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_active && o.is_expired(now))
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of active offer amounts; must equal the property's escrow balance.
    #[must_use]
    pub fn active_total(&self, property_id: PropertyId) -> Amount {
        self.active(property_id).map(|o| o.amount).sum()
    }

    /// Properties that have at least one book entry.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.books.keys().copied()
    }

    /// # Errors
    /// `IllegalState` if the index is unknown.
    pub fn entry(&self, property_id: PropertyId, index: usize) -> Result<&Offer> {
        self.offers(property_id)
            .get(index)
            .ok_or_else(|| MarketError::illegal_state(format!("no offer #{index} on {property_id}")))
    }

    fn entry_mut(&mut self, property_id: PropertyId, index: usize) -> Result<&mut Offer> {
        self.books
            .get_mut(&property_id)
            .and_then(|book| book.get_mut(index))
            .ok_or_else(|| MarketError::illegal_state(format!("no offer #{index} on {property_id}")))
    }

    fn active_indices(&self, property_id: PropertyId) -> Vec<usize> {
        self.offers(property_id)
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_active)
            .map(|(i, _)| i)
            .collect()
    }

    // =================================================================
    // Rollback
    // =================================================================

    /// Copy of a property's book, for restoring after a failed operation.
    #[must_use]
    pub fn snapshot(&self, property_id: PropertyId) -> Vec<Offer> {
        self.offers(property_id).to_vec()
    }

    pub fn restore(&mut self, property_id: PropertyId, offers: Vec<Offer>) {
        if offers.is_empty() {
            self.books.remove(&property_id);
        } else {
            self.books.insert(property_id, offers);
        }
    }
}
