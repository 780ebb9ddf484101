//! Payout rail: the outbound transfer boundary.
//!
//! The engine commits every state change for an operation first and only
//! then dispatches the resulting payouts. A rail must apply a batch
//! all-or-nothing; if it rejects the batch the engine rolls the whole
//! operation back.

use std::collections::HashMap;

use estatemesh_types::{Amount, Identity, MarketError, Payout, Result};

/// Destination for committed payouts.
pub trait PayoutRail {
    /// Deliver a batch of payouts.
    ///
    /// # Errors
    /// `PayoutRejected` if any transfer in the batch cannot be delivered.
    /// Nothing from the batch may be applied in that case.
    fn dispatch(&mut self, payouts: &[Payout]) -> Result<()>;
}

/// In-memory rail that credits recipients and keeps the full history.
#[derive(Debug, Clone, Default)]
pub struct PayoutLedger {
    credited: HashMap<Identity, Amount>,
    history: Vec<Payout>,
}

impl PayoutLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total ever paid to `identity`.
    #[must_use]
    pub fn credited(&self, identity: Identity) -> Amount {
        self.credited.get(&identity).copied().unwrap_or(0)
    }

    /// Every delivered payout, in dispatch order.
    #[must_use]
    pub fn history(&self) -> &[Payout] {
        &self.history
    }

    #[must_use]
    pub fn total_paid(&self) -> Amount {
        self.history.iter().map(|p| p.amount).sum()
    }
}

impl PayoutRail for PayoutLedger {
    fn dispatch(&mut self, payouts: &[Payout]) -> Result<()> {
        // Validate the whole batch against current balances before writing.
        let mut batch: HashMap<Identity, Amount> = HashMap::with_capacity(payouts.len());
        for payout in payouts {
            let pending = batch.entry(payout.recipient).or_insert(0);
            *pending = pending
                .checked_add(payout.amount)
                .filter(|total| total.checked_add(self.credited(payout.recipient)).is_some())
                .ok_or_else(|| MarketError::PayoutRejected {
                    reason: format!("credit overflow for {}", payout.recipient),
                })?;
        }
        for (recipient, amount) in batch {
            *self.credited.entry(recipient).or_insert(0) += amount;
        }
        self.history.extend_from_slice(payouts);
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing {
    use super::*;

    /// Rail that refuses every batch while `failing` is set.
    #[derive(Debug, Default)]
    pub struct FlakyRail {
        pub inner: PayoutLedger,
        pub failing: bool,
    }

    impl PayoutRail for FlakyRail {
        fn dispatch(&mut self, payouts: &[Payout]) -> Result<()> {
            if self.failing && !payouts.is_empty() {
                return Err(MarketError::PayoutRejected {
                    reason: "rail offline".to_string(),
                });
            }
            self.inner.dispatch(payouts)
        }
    }
}

#[cfg(test)]
mod tests {
    use estatemesh_types::{PayoutReason, PropertyId};

    use super::testing::FlakyRail;
    use super::*;

    #[test]
    fn dispatch_credits_recipients() {
        let alice = Identity::new();
        let bob = Identity::new();
        let mut rail = PayoutLedger::new();

        rail.dispatch(&[
            Payout::new(PropertyId(0), alice, 70, PayoutReason::SellerProceeds),
            Payout::new(PropertyId(0), bob, 30, PayoutReason::Refund),
            Payout::new(PropertyId(1), alice, 5, PayoutReason::Refund),
        ])
        .unwrap();

        assert_eq!(rail.credited(alice), 75);
        assert_eq!(rail.credited(bob), 30);
        assert_eq!(rail.history().len(), 3);
        assert_eq!(rail.total_paid(), 105);
    }

    #[test]
    fn overflowing_batch_applies_nothing() {
        let alice = Identity::new();
        let mut rail = PayoutLedger::new();
        rail.dispatch(&[Payout::new(PropertyId(0), alice, 1, PayoutReason::Refund)])
            .unwrap();

        let err = rail
            .dispatch(&[
                Payout::new(PropertyId(0), alice, 1, PayoutReason::Refund),
                Payout::new(PropertyId(0), alice, u128::MAX, PayoutReason::Refund),
            ])
            .unwrap_err();
        assert!(matches!(err, MarketError::PayoutRejected { .. }));
        assert_eq!(rail.credited(alice), 1);
        assert_eq!(rail.history().len(), 1);
    }

    #[test]
    fn overflow_against_prior_credit_leaves_batch_unapplied() {
        let alice = Identity::new();
        let bob = Identity::new();
        let mut rail = PayoutLedger::new();
        rail.dispatch(&[Payout::new(PropertyId(0), bob, u128::MAX - 5, PayoutReason::SellerProceeds)])
            .unwrap();

        let err = rail
            .dispatch(&[
                Payout::new(PropertyId(1), alice, 40, PayoutReason::Refund),
                Payout::new(PropertyId(1), bob, 6, PayoutReason::Refund),
            ])
            .unwrap_err();
        assert!(matches!(err, MarketError::PayoutRejected { .. }));
        assert_eq!(rail.credited(alice), 0);
        assert_eq!(rail.credited(bob), u128::MAX - 5);

        rail.dispatch(&[Payout::new(PropertyId(1), bob, 5, PayoutReason::Refund)])
            .unwrap();
        assert_eq!(rail.credited(bob), u128::MAX);
    }

    #[test]
    fn flaky_rail_rejects_when_failing() {
        let mut rail = FlakyRail {
            failing: true,
            ..FlakyRail::default()
        };
        let batch = [Payout::new(PropertyId(0), Identity::new(), 1, PayoutReason::Refund)];
        assert!(rail.dispatch(&batch).is_err());
        assert!(rail.dispatch(&[]).is_ok());
        rail.failing = false;
        rail.dispatch(&batch).unwrap();
        assert_eq!(rail.inner.total_paid(), 1);
    }
}
