//! Settlement guard: reentrancy lock plus double-settlement protection.
//!
//! A property is *in flight* from the moment its payouts are handed to the
//! payout rail until the rail returns. Any attempt to mutate the property
//! in that window is rejected with `TransferInFlight`. Once a sale
//! commits, the property is recorded as settled and can never be settled
//! again.

use std::collections::HashSet;

use estatemesh_types::{MarketError, PropertyId, Result};

#[derive(Debug, Clone, Default)]
pub struct SettlementGuard {
    in_flight: HashSet<PropertyId>,
    settled: HashSet<PropertyId>,
}

impl SettlementGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if the property's payouts are currently being dispatched.
    ///
    /// # Errors
    /// `TransferInFlight`.
    pub fn check_idle(&self, property_id: PropertyId) -> Result<()> {
        if self.in_flight.contains(&property_id) {
            tracing::warn!(property = %property_id, "Rejected reentrant call during payout");
            return Err(MarketError::TransferInFlight(property_id));
        }
        Ok(())
    }

    /// Take the in-flight lock for a property.
    ///
    /// # Errors
    /// `TransferInFlight` if the lock is already held.
    pub fn begin(&mut self, property_id: PropertyId) -> Result<()> {
        self.check_idle(property_id)?;
        self.in_flight.insert(property_id);
        Ok(())
    }

    /// Release the in-flight lock. Called on success and failure alike.
    pub fn finish(&mut self, property_id: PropertyId) {
        self.in_flight.remove(&property_id);
    }

    #[must_use]
    pub fn is_in_flight(&self, property_id: PropertyId) -> bool {
        self.in_flight.contains(&property_id)
    }

    /// Record that a property's sale has committed.
    ///
    /// # Errors
    /// `AlreadySettled` if it was recorded before.
    pub fn mark_settled(&mut self, property_id: PropertyId) -> Result<()> {
        if !self.settled.insert(property_id) {
            return Err(MarketError::AlreadySettled(property_id));
        }
        Ok(())
    }

    /// Forget a settlement that was rolled back.
    pub fn unmark_settled(&mut self, property_id: PropertyId) {
        self.settled.remove(&property_id);
    }

    #[must_use]
    pub fn is_settled(&self, property_id: PropertyId) -> bool {
        self.settled.contains(&property_id)
    }

    #[must_use]
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PropertyId = PropertyId(7);

    #[test]
    fn nested_begin_is_rejected() {
        let mut guard = SettlementGuard::new();
        guard.begin(P).unwrap();
        assert!(guard.is_in_flight(P));
        assert!(matches!(guard.begin(P), Err(MarketError::TransferInFlight(P))));
        assert!(guard.check_idle(P).is_err());
        assert!(guard.check_idle(PropertyId(8)).is_ok());

        guard.finish(P);
        assert!(guard.check_idle(P).is_ok());
        guard.begin(P).unwrap();
    }

    #[test]
    fn double_settlement_fails() {
        let mut guard = SettlementGuard::new();
        guard.mark_settled(P).unwrap();
        assert!(guard.is_settled(P));
        assert!(matches!(guard.mark_settled(P), Err(MarketError::AlreadySettled(P))));
        assert_eq!(guard.settled_count(), 1);
    }

    #[test]
    fn unmark_allows_retry() {
        let mut guard = SettlementGuard::new();
        guard.mark_settled(P).unwrap();
        guard.unmark_settled(P);
        assert!(!guard.is_settled(P));
        guard.mark_settled(P).unwrap();
    }
}
