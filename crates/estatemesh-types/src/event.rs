//! Notifications emitted by mutating operations.
//!
//! Every successful mutating call appends one or more [`MarketEvent`]s to
//! the engine's notification log. Failed calls emit nothing, and queries
//! never emit.

use serde::{Deserialize, Serialize};

use crate::{Amount, BasisPoints, DocumentHash, Identity, PropertyId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    PropertyListed {
        property_id: PropertyId,
        seller: Identity,
        price: Amount,
        location: String,
    },
    OfferSubmitted {
        property_id: PropertyId,
        buyer: Identity,
        amount: Amount,
    },
    OfferAccepted {
        property_id: PropertyId,
        buyer: Identity,
        amount: Amount,
    },
    OfferRejected {
        property_id: PropertyId,
        buyer: Identity,
    },
    OfferExpired {
        property_id: PropertyId,
        buyer: Identity,
        amount: Amount,
    },
    /// Settlement completed: funds distributed and title transferred.
    TransactionCompleted {
        property_id: PropertyId,
        seller: Identity,
        buyer: Identity,
        amount: Amount,
        platform_cut: Amount,
        agent_cut: Amount,
        seller_proceeds: Amount,
    },
    PropertyDelisted {
        property_id: PropertyId,
        seller: Identity,
    },
    PriceUpdated {
        property_id: PropertyId,
        old_price: Amount,
        new_price: Amount,
    },
    DocumentAdded {
        property_id: PropertyId,
        hash: DocumentHash,
    },
    PropertyViewed {
        property_id: PropertyId,
        viewer: Identity,
    },
    InspectionUpdated {
        property_id: PropertyId,
        passed: bool,
    },
    FinancingApproved {
        property_id: PropertyId,
    },
    FinancingRejected {
        property_id: PropertyId,
    },
    AuctionStarted {
        property_id: PropertyId,
        minimum_bid: Amount,
        end_time: Timestamp,
    },
    /// `winner` is `None` when the auction closed without bids.
    AuctionEnded {
        property_id: PropertyId,
        winner: Option<Identity>,
        amount: Amount,
    },
    AgentAuthorized {
        agent: Identity,
        authorized: bool,
    },
    AppraiserChanged {
        appraiser: Identity,
    },
    PlatformFeeUpdated {
        old_fee: BasisPoints,
        new_fee: BasisPoints,
    },
    DepositRefunded {
        property_id: PropertyId,
        buyer: Identity,
        amount: Amount,
    },
    EscrowWithdrawn {
        property_id: PropertyId,
        recipient: Identity,
        amount: Amount,
    },
    Paused {
        by: Identity,
    },
    Unpaused {
        by: Identity,
    },
}

impl MarketEvent {
    /// Notification name, e.g. `"OfferSubmitted"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PropertyListed { .. } => "PropertyListed",
            Self::OfferSubmitted { .. } => "OfferSubmitted",
            Self::OfferAccepted { .. } => "OfferAccepted",
            Self::OfferRejected { .. } => "OfferRejected",
            Self::OfferExpired { .. } => "OfferExpired",
            Self::TransactionCompleted { .. } => "TransactionCompleted",
            Self::PropertyDelisted { .. } => "PropertyDelisted",
            Self::PriceUpdated { .. } => "PriceUpdated",
            Self::DocumentAdded { .. } => "DocumentAdded",
            Self::PropertyViewed { .. } => "PropertyViewed",
            Self::InspectionUpdated { .. } => "InspectionUpdated",
            Self::FinancingApproved { .. } => "FinancingApproved",
            Self::FinancingRejected { .. } => "FinancingRejected",
            Self::AuctionStarted { .. } => "AuctionStarted",
            Self::AuctionEnded { .. } => "AuctionEnded",
            Self::AgentAuthorized { .. } => "AgentAuthorized",
            Self::AppraiserChanged { .. } => "AppraiserChanged",
            Self::PlatformFeeUpdated { .. } => "PlatformFeeUpdated",
            Self::DepositRefunded { .. } => "DepositRefunded",
            Self::EscrowWithdrawn { .. } => "EscrowWithdrawn",
            Self::Paused { .. } => "Paused",
            Self::Unpaused { .. } => "Unpaused",
        }
    }

    /// Property the notification concerns, if any.
    #[must_use]
    pub fn property_id(&self) -> Option<PropertyId> {
        match self {
            Self::PropertyListed { property_id, .. }
            | Self::OfferSubmitted { property_id, .. }
            | Self::OfferAccepted { property_id, .. }
            | Self::OfferRejected { property_id, .. }
            | Self::OfferExpired { property_id, .. }
            | Self::TransactionCompleted { property_id, .. }
            | Self::PropertyDelisted { property_id, .. }
            | Self::PriceUpdated { property_id, .. }
            | Self::DocumentAdded { property_id, .. }
            | Self::PropertyViewed { property_id, .. }
            | Self::InspectionUpdated { property_id, .. }
            | Self::FinancingApproved { property_id }
            | Self::FinancingRejected { property_id }
            | Self::AuctionStarted { property_id, .. }
            | Self::AuctionEnded { property_id, .. }
            | Self::DepositRefunded { property_id, .. }
            | Self::EscrowWithdrawn { property_id, .. } => Some(*property_id),
            Self::AgentAuthorized { .. }
            | Self::AppraiserChanged { .. }
            | Self::PlatformFeeUpdated { .. }
            | Self::Paused { .. }
            | Self::Unpaused { .. } => None,
        }
    }
}
