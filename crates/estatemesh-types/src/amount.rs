//! Monetary and time primitives.
//!
//! Every amount is an unsigned integer in the smallest currency unit.
//! There is no floating point anywhere in the fund path; [`BasisPoints`]
//! only converts to [`Decimal`] for display.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MarketError, Result, constants};

/// An amount in the smallest currency unit.
pub type Amount = u128;

/// Seconds since the UNIX epoch, as read from the engine clock.
pub type Timestamp = u64;

/// A rate expressed in basis points (1/100 of a percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(pub u16);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(constants::BPS_DENOMINATOR);

    #[must_use]
    pub fn new(bps: u16) -> Self {
        Self(bps)
    }

    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }

    /// `true` if the rate is at most 100%.
    #[must_use]
    pub fn is_valid_fraction(self) -> bool {
        self.0 <= constants::BPS_DENOMINATOR
    }

    /// `true` if `self` and `other` together are at most 100%.
    #[must_use]
    pub fn fits_with(self, other: Self) -> bool {
        u32::from(self.0) + u32::from(other.0) <= u32::from(constants::BPS_DENOMINATOR)
    }

    /// `amount * bps / 10000`, rounded down.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the intermediate product overflows.
    pub fn apply(self, amount: Amount) -> Result<Amount> {
        amount
            .checked_mul(Amount::from(self.0))
            .map(|scaled| scaled / Amount::from(constants::BPS_DENOMINATOR))
            .ok_or_else(|| MarketError::InvalidAmount {
                reason: format!("{amount} * {self} overflows"),
            })
    }

    /// The rate as a percentage, e.g. 250 bps → `2.50`.
    #[must_use]
    pub fn as_percent(self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
