//! Fee distribution for a winning amount.
//!
//! ```text
//! platform_cut    = amount × platform_fee_bps / 10000     (floor)
//! agent_cut       = amount × commission_bps  / 10000     (floor, 0 without agent)
//! seller_proceeds = amount − platform_cut − agent_cut
//! ```
//!
//! Rounding remainders always land with the seller, so the three parts sum
//! to exactly `amount`.

use estatemesh_types::{Amount, BasisPoints, MarketError, Result};
use serde::{Deserialize, Serialize};

/// How a winning amount is divided at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub platform_cut: Amount,
    pub agent_cut: Amount,
    pub seller_proceeds: Amount,
}

impl FeeSplit {
    /// Compute the split. `agent_commission` is `None` when the property has
    /// no agent.
    ///
    /// # Errors
    /// `InvalidFee` if a rate exceeds 100%, the combined cuts exceed the
    /// amount, or the arithmetic overflows.
    pub fn compute(
        amount: Amount,
        platform_fee: BasisPoints,
        agent_commission: Option<BasisPoints>,
    ) -> Result<Self> {
        let platform_cut = cut(amount, platform_fee)?;
        let agent_cut = match agent_commission {
            Some(rate) => cut(amount, rate)?,
            None => 0,
        };
        let seller_proceeds = amount
            .checked_sub(platform_cut)
            .and_then(|rest| rest.checked_sub(agent_cut))
            .ok_or_else(|| MarketError::InvalidFee {
                reason: format!(
                    "platform fee {platform_fee} plus commission exceed the sale amount {amount}"
                ),
            })?;
        Ok(Self {
            platform_cut,
            agent_cut,
            seller_proceeds,
        })
    }

    #[must_use]
    pub fn total(&self) -> Amount {
        self.platform_cut + self.agent_cut + self.seller_proceeds
    }
}

fn cut(amount: Amount, rate: BasisPoints) -> Result<Amount> {
    if !rate.is_valid_fraction() {
        return Err(MarketError::InvalidFee {
            reason: format!("rate {rate} exceeds {}", BasisPoints::FULL),
        });
    }
    rate.apply(amount).map_err(|_| MarketError::InvalidFee {
        reason: format!("{rate} of {amount} overflows"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn agent_sale_split() {
        let split = FeeSplit::compute(100 * ETH, BasisPoints(250), Some(BasisPoints(500))).unwrap();
        assert_eq!(split.platform_cut, 2_500_000_000_000_000_000);
        assert_eq!(split.agent_cut, 5 * ETH);
        assert_eq!(split.seller_proceeds, 92_500_000_000_000_000_000);
        assert_eq!(split.total(), 100 * ETH);
    }

    #[test]
    fn no_agent_means_no_commission() {
        let split = FeeSplit::compute(10 * ETH, BasisPoints(250), None).unwrap();
        assert_eq!(split.agent_cut, 0);
        assert_eq!(split.seller_proceeds, 10 * ETH - split.platform_cut);
    }

    #[test]
    fn remainder_goes_to_seller() {
        let split = FeeSplit::compute(999, BasisPoints(250), Some(BasisPoints(1_000))).unwrap();
        assert_eq!(split.platform_cut, 24);
        assert_eq!(split.agent_cut, 99);
        assert_eq!(split.seller_proceeds, 876);
        assert_eq!(split.total(), 999);
    }

    #[test]
    fn combined_cuts_over_amount_rejected() {
        let err = FeeSplit::compute(100, BasisPoints(9_500), Some(BasisPoints(1_000))).unwrap_err();
        assert!(matches!(err, MarketError::InvalidFee { .. }));
    }

    #[test]
    fn rate_over_full_rejected() {
        let err = FeeSplit::compute(100, BasisPoints(10_001), None).unwrap_err();
        assert!(matches!(err, MarketError::InvalidFee { .. }));
    }

    #[test]
    fn full_fee_leaves_seller_nothing() {
        let split = FeeSplit::compute(100, BasisPoints::FULL, None).unwrap();
        assert_eq!(split.platform_cut, 100);
        assert_eq!(split.seller_proceeds, 0);
    }
}
