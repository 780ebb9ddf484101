//! Outbound fund movements.
//!
//! The escrow ledger produces [`Payout`]s as bookkeeping is committed; the
//! engine hands the whole batch to its payout rail only afterwards.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, PropertyId};

/// Why funds are leaving escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutReason {
    /// Deposit returned to a buyer or bidder.
    Refund,
    /// Seller's share of the winning amount.
    SellerProceeds,
    /// Listing agent's commission.
    AgentCommission,
    /// Platform owner's fee.
    PlatformFee,
    /// Owner emergency drain of stuck escrow.
    EmergencyWithdrawal,
}

impl std::fmt::Display for PayoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refund => write!(f, "REFUND"),
            Self::SellerProceeds => write!(f, "SELLER_PROCEEDS"),
            Self::AgentCommission => write!(f, "AGENT_COMMISSION"),
            Self::PlatformFee => write!(f, "PLATFORM_FEE"),
            Self::EmergencyWithdrawal => write!(f, "EMERGENCY_WITHDRAWAL"),
        }
    }
}

/// A single transfer out of a property's escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub property_id: PropertyId,
    pub recipient: Identity,
    pub amount: Amount,
    pub reason: PayoutReason,
}

impl Payout {
    #[must_use]
    pub fn new(property_id: PropertyId, recipient: Identity, amount: Amount, reason: PayoutReason) -> Self {
        Self {
            property_id,
            recipient,
            amount,
            reason,
        }
    }
}
