//! Escrow ledger: per-property held-balance accounting.
//!
//! Deposits grow a property's held balance; releases and refunds shrink it
//! and hand back a [`Payout`] describing the transfer. The ledger never
//! moves money itself: payouts are dispatched by the caller only after all
//! bookkeeping for the operation is committed.
//!
//! Invariant per property:
//! ```text
//! held == deposited - released - refunded  (never negative)
//! ```

use std::collections::HashMap;

use estatemesh_types::{Amount, Identity, MarketError, Payout, PayoutReason, PropertyId, Result};

/// Running totals for one property's escrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscrowAccount {
    pub held: Amount,
    pub deposited: Amount,
    pub released: Amount,
    pub refunded: Amount,
}

impl EscrowAccount {
    /// `held` matches the flow totals.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.deposited
            .checked_sub(self.released)
            .and_then(|rest| rest.checked_sub(self.refunded))
            == Some(self.held)
    }
}

/// Held balances for every property.
#[derive(Debug, Clone, Default)]
pub struct EscrowLedger {
    accounts: HashMap<PropertyId, EscrowAccount>,
}

impl EscrowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the property's held balance.
    ///
    /// # Errors
    /// `InvalidAmount` if `amount` is zero or the balance would overflow.
    pub fn deposit(&mut self, property_id: PropertyId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(MarketError::InvalidAmount {
                reason: "escrow deposit must be positive".to_string(),
            });
        }
        let account = self.accounts.entry(property_id).or_default();
        let held = account
            .held
            .checked_add(amount)
            .ok_or_else(|| MarketError::InvalidAmount {
                reason: format!("escrow on {property_id} would overflow"),
            })?;
        let deposited = account.deposited.checked_add(amount).ok_or_else(|| {
            MarketError::InvalidAmount {
                reason: format!("deposit total on {property_id} would overflow"),
            }
        })?;
        account.held = held;
        account.deposited = deposited;
        tracing::debug!(property = %property_id, amount, held, "Escrow deposit");
        Ok(())
    }

    /// Pay `amount` out of escrow to `recipient`.
    ///
    /// # Errors
    /// `InvalidAmount` for zero, `InsufficientEscrow` if `amount` exceeds the
    /// held balance. Nothing changes on error.
    pub fn release(
        &mut self,
        property_id: PropertyId,
        amount: Amount,
        recipient: Identity,
        reason: PayoutReason,
    ) -> Result<Payout> {
        let account = self.debit(property_id, amount)?;
        if reason == PayoutReason::Refund {
            account.refunded += amount;
        } else {
            account.released += amount;
        }
        tracing::debug!(
            property = %property_id,
            recipient = %recipient,
            amount,
            reason = %reason,
            held = account.held,
            "Escrow released"
        );
        Ok(Payout::new(property_id, recipient, amount, reason))
    }

    /// Return `amount` to `recipient`. Same mechanics as [`Self::release`].
    ///
    /// # Errors
    /// As [`Self::release`].
    pub fn refund(&mut self, property_id: PropertyId, amount: Amount, recipient: Identity) -> Result<Payout> {
        self.release(property_id, amount, recipient, PayoutReason::Refund)
    }

    /// Release the entire held balance to `recipient`.
    ///
    /// # Errors
    /// `IllegalState` if nothing is held.
    pub fn drain(&mut self, property_id: PropertyId, recipient: Identity) -> Result<Payout> {
        let held = self.balance(property_id);
        if held == 0 {
            return Err(MarketError::illegal_state(format!(
                "no escrow held on {property_id}"
            )));
        }
        self.release(property_id, held, recipient, PayoutReason::EmergencyWithdrawal)
    }

    fn debit(&mut self, property_id: PropertyId, amount: Amount) -> Result<&mut EscrowAccount> {
        if amount == 0 {
            return Err(MarketError::InvalidAmount {
                reason: "escrow release must be positive".to_string(),
            });
        }
        let held = self.balance(property_id);
        if amount > held {
            return Err(MarketError::InsufficientEscrow {
                property: property_id,
                needed: amount,
                held,
            });
        }
        let account = self.accounts.entry(property_id).or_default();
        account.held -= amount;
        Ok(account)
    }

    /// Currently held on a property.
    #[must_use]
    pub fn balance(&self, property_id: PropertyId) -> Amount {
        self.accounts.get(&property_id).map_or(0, |a| a.held)
    }

    /// Full account totals for a property.
    #[must_use]
    pub fn account(&self, property_id: PropertyId) -> EscrowAccount {
        self.accounts.get(&property_id).copied().unwrap_or_default()
    }

    /// Put back an account captured before a failed operation.
    pub fn restore(&mut self, property_id: PropertyId, account: EscrowAccount) {
        if account == EscrowAccount::default() {
            self.accounts.remove(&property_id);
        } else {
            self.accounts.insert(property_id, account);
        }
    }

    /// Sum held across all properties.
    #[must_use]
    pub fn total_held(&self) -> Amount {
        self.accounts.values().map(|a| a.held).sum()
    }
}
