//! Gated settlement of a winning offer.
//!
//! Runs for `acceptOffer`, `acceptFirstOffer` and `endAuction`:
//! 1. Check gates: listed, not sold, inspection passed, financing approved
//! 2. Split the winning amount (platform, agent, seller)
//! 3. Release escrow to agent, platform owner, seller
//! 4. Close the winning offer as accepted
//! 5. Mark the property sold, record buyer and sale price, clear any auction
//! 6. Transfer the title seller → buyer
//! 7. Refund every other active offer as cancelled
//! 8. Record the property as settled
//!
//! The settler only performs bookkeeping and returns the payouts. If any
//! step fails the caller restores its snapshot of the property; nothing
//! has been dispatched at that point.

use estatemesh_ledger::{EscrowLedger, TitleRegistry};
use estatemesh_offers::OfferBook;
use estatemesh_types::{
    Amount, BasisPoints, Identity, MarketError, Offer, OfferOutcome, Payout, PayoutReason, Property,
    PropertyId, Result,
};

use crate::fee_split::FeeSplit;
use crate::guard::SettlementGuard;

/// Mutable ledgers touched by a settlement.
pub struct SettlementLedgers<'a> {
    pub book: &'a mut OfferBook,
    pub escrow: &'a mut EscrowLedger,
    pub titles: &'a mut TitleRegistry,
    pub guard: &'a mut SettlementGuard,
}

/// Result of a committed settlement.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub property_id: PropertyId,
    pub seller: Identity,
    pub buyer: Identity,
    pub amount: Amount,
    pub split: FeeSplit,
    /// Every transfer out of escrow, distribution first, then refunds.
    pub payouts: Vec<Payout>,
    /// Other offers closed and refunded by this sale.
    pub cancelled: Vec<Offer>,
}

/// Settles sales for one platform owner at one fee rate.
#[derive(Debug, Clone, Copy)]
pub struct Settler {
    platform_owner: Identity,
    platform_fee: BasisPoints,
}

impl Settler {
    #[must_use]
    pub fn new(platform_owner: Identity, platform_fee: BasisPoints) -> Self {
        Self {
            platform_owner,
            platform_fee,
        }
    }

    /// Check the lifecycle and approval gates.
    ///
    /// # Errors
    /// `AlreadySold`, `NotListed`, or `GateClosed` naming the missing approval.
    pub fn check_gates(property: &Property) -> Result<()> {
        if property.is_sold {
            return Err(MarketError::AlreadySold(property.id));
        }
        if !property.is_listed {
            return Err(MarketError::NotListed(property.id));
        }
        if !property.is_inspection_passed {
            return Err(MarketError::GateClosed {
                property: property.id,
                reason: "inspection not passed".to_string(),
            });
        }
        if !property.financing_approved {
            return Err(MarketError::GateClosed {
                property: property.id,
                reason: "financing not approved".to_string(),
            });
        }
        Ok(())
    }

    /// Settle the sale of `property` to the offer at `winner_index`.
    ///
    /// # Errors
    /// Gate errors, `AlreadySettled`, `InvalidFee`, escrow and title errors.
    /// State may be partially updated on error; the caller must roll back.
    pub fn settle(
        &self,
        property: &mut Property,
        ledgers: SettlementLedgers<'_>,
        winner_index: usize,
    ) -> Result<SettlementOutcome> {
        Self::check_gates(property)?;
        let id = property.id;
        if ledgers.guard.is_settled(id) {
            return Err(MarketError::AlreadySettled(id));
        }

        let winner = ledgers.book.entry(id, winner_index)?.clone();
        if !winner.is_active {
            return Err(MarketError::illegal_state(format!(
                "winning offer from {} on {id} is no longer active",
                winner.buyer
            )));
        }

        let commission = property.effective_commission();
        let split = FeeSplit::compute(winner.amount, self.platform_fee, commission.map(|(_, rate)| rate))?;

        let mut payouts = Vec::new();
        let mut pay = |recipient: Identity, amount: Amount, reason: PayoutReason| -> Result<()> {
            if amount > 0 {
                payouts.push(ledgers.escrow.release(id, amount, recipient, reason)?);
            }
            Ok(())
        };
        if let Some((agent, _)) = commission {
            pay(agent, split.agent_cut, PayoutReason::AgentCommission)?;
        }
        pay(self.platform_owner, split.platform_cut, PayoutReason::PlatformFee)?;
        pay(property.seller, split.seller_proceeds, PayoutReason::SellerProceeds)?;

        ledgers.book.close(id, winner_index, OfferOutcome::Accepted)?;

        property.is_sold = true;
        property.is_listed = false;
        property.buyer = Some(winner.buyer);
        property.sale_price = Some(winner.amount);
        property.clear_auction();

        ledgers.titles.transfer(id, property.seller, winner.buyer)?;

        let mut cancelled = Vec::new();
        for (offer, refund) in ledgers
            .book
            .refund_all_active(ledgers.escrow, id, OfferOutcome::Cancelled)?
        {
            cancelled.push(offer);
            payouts.push(refund);
        }

        ledgers.guard.mark_settled(id)?;

        tracing::info!(
            property = %id,
            seller = %property.seller,
            buyer = %winner.buyer,
            amount = winner.amount,
            platform_cut = split.platform_cut,
            agent_cut = split.agent_cut,
            fee_pct = %self.platform_fee.as_percent(),
            refunded = cancelled.len(),
            "Property settled"
        );

        Ok(SettlementOutcome {
            property_id: id,
            seller: property.seller,
            buyer: winner.buyer,
            amount: winner.amount,
            split,
            payouts,
            cancelled,
        })
    }
}
