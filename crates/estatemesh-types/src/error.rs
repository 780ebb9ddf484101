//! Error types for the EstateMesh marketplace engine.
//!
//! All errors use the `EM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access control errors
//! - 2xx: Property registry / title errors
//! - 3xx: Escrow errors
//! - 4xx: Offer book errors
//! - 5xx: Auction errors
//! - 6xx: Settlement errors
//! - 9xx: General / internal errors
//!
//! Callers that only care about the category use [`MarketError::kind`].

use thiserror::Error;

use crate::{Amount, Identity, PropertyId};

/// Coarse failure category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidArgument,
    IllegalState,
    InsufficientEscrow,
    Paused,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::IllegalState => write!(f, "ILLEGAL_STATE"),
            Self::InsufficientEscrow => write!(f, "INSUFFICIENT_ESCROW"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}

/// Central error enum for all EstateMesh operations.
#[derive(Debug, Error)]
pub enum MarketError {
    // =================================================================
    // Access Control Errors (1xx)
    // =================================================================
    /// The caller lacks the role required for this operation.
    #[error("EM_ERR_100: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Mutating operations are disabled by the global pause switch.
    #[error("EM_ERR_101: Marketplace is paused")]
    Paused,

    // =================================================================
    // Registry / Title Errors (2xx)
    // =================================================================
    /// No property with this id exists.
    #[error("EM_ERR_200: Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Listing parameters failed validation.
    #[error("EM_ERR_201: Invalid listing: {reason}")]
    InvalidListing { reason: String },

    /// The property is not listed (delisted or sold).
    #[error("EM_ERR_202: Property not listed: {0}")]
    NotListed(PropertyId),

    /// The property has already been sold.
    #[error("EM_ERR_203: Property already sold: {0}")]
    AlreadySold(PropertyId),

    /// Ownership token mint/transfer failed.
    #[error("EM_ERR_204: Title error: {reason}")]
    Title { reason: String },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// A release or refund exceeds the held balance.
    #[error("EM_ERR_300: Insufficient escrow on {property}: need {needed}, held {held}")]
    InsufficientEscrow {
        property: PropertyId,
        needed: Amount,
        held: Amount,
    },

    /// Amount failed validation (zero, overflow).
    #[error("EM_ERR_301: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The caller has no held funds to reclaim on this property.
    #[error("EM_ERR_302: Nothing to refund on {0}")]
    NothingToRefund(PropertyId),

    /// Escrow no longer equals the sum of active offers. Critical alert.
    #[error("EM_ERR_303: Escrow invariant violation: {reason}")]
    EscrowInvariantViolation { reason: String },

    /// The payout rail rejected a disbursement batch.
    #[error("EM_ERR_304: Payout rejected: {reason}")]
    PayoutRejected { reason: String },

    // =================================================================
    // Offer Errors (4xx)
    // =================================================================
    /// No active offer from this buyer on this property.
    #[error("EM_ERR_400: No active offer from {buyer} on {property}")]
    OfferNotFound { property: PropertyId, buyer: Identity },

    /// The buyer already holds an active offer on this property.
    #[error("EM_ERR_401: Duplicate active offer from {buyer} on {property}")]
    DuplicateOffer { property: PropertyId, buyer: Identity },

    /// No active offer exists on the property.
    #[error("EM_ERR_402: No active offers on {0}")]
    NoActiveOffers(PropertyId),

    /// Offer parameters failed validation.
    #[error("EM_ERR_403: Invalid offer: {reason}")]
    InvalidOffer { reason: String },

    /// The targeted offer has passed its expiry.
    #[error("EM_ERR_404: Offer from {buyer} on {property} has expired")]
    OfferExpired { property: PropertyId, buyer: Identity },

    /// The offer is still live; funds are reclaimed through the seller or expiry.
    #[error("EM_ERR_405: Offer from {buyer} on {property} is still live")]
    OfferStillLive { property: PropertyId, buyer: Identity },

    // =================================================================
    // Auction Errors (5xx)
    // =================================================================
    /// Bid is below the minimum or does not beat the current highest bid.
    #[error("EM_ERR_500: Bid too low: {value} (minimum {minimum}, highest {highest})")]
    BidTooLow {
        value: Amount,
        minimum: Amount,
        highest: Amount,
    },

    /// Auction parameters or timing are invalid.
    #[error("EM_ERR_501: Invalid auction: {reason}")]
    InvalidAuction { reason: String },

    /// The auction is in the wrong state for this action.
    #[error("EM_ERR_502: Auction state conflict on {property}: {reason}")]
    AuctionConflict { property: PropertyId, reason: String },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// Inspection or financing gate has not been passed.
    #[error("EM_ERR_600: Settlement gate closed on {property}: {reason}")]
    GateClosed { property: PropertyId, reason: String },

    /// The property has already been settled (double settlement).
    #[error("EM_ERR_601: Property already settled: {0}")]
    AlreadySettled(PropertyId),

    /// A payout for this property is in flight; nested mutation rejected.
    #[error("EM_ERR_602: Transfer in flight for {0}")]
    TransferInFlight(PropertyId),

    /// Fee or commission configuration is out of range.
    #[error("EM_ERR_603: Invalid fee: {reason}")]
    InvalidFee { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Generic argument validation failure.
    #[error("EM_ERR_900: Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Action incompatible with current state.
    #[error("EM_ERR_901: Illegal state: {reason}")]
    IllegalState { reason: String },

    /// Serialization / deserialization error.
    #[error("EM_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values).
    #[error("EM_ERR_903: Configuration error: {0}")]
    Configuration(String),
}

impl MarketError {
    /// The category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Paused => ErrorKind::Paused,
            Self::PropertyNotFound(_) | Self::OfferNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidListing { .. }
            | Self::InvalidAmount { .. }
            | Self::DuplicateOffer { .. }
            | Self::InvalidOffer { .. }
            | Self::BidTooLow { .. }
            | Self::InvalidAuction { .. }
            | Self::InvalidFee { .. }
            | Self::InvalidArgument { .. }
            | Self::Serialization(_)
            | Self::Configuration(_) => ErrorKind::InvalidArgument,
            Self::NotListed(_)
            | Self::AlreadySold(_)
            | Self::Title { .. }
            | Self::NothingToRefund(_)
            | Self::PayoutRejected { .. }
            | Self::NoActiveOffers(_)
            | Self::OfferExpired { .. }
            | Self::OfferStillLive { .. }
            | Self::AuctionConflict { .. }
            | Self::GateClosed { .. }
            | Self::AlreadySettled(_)
            | Self::TransferInFlight(_)
            | Self::IllegalState { .. } => ErrorKind::IllegalState,
            Self::InsufficientEscrow { .. } | Self::EscrowInvariantViolation { .. } => {
                ErrorKind::InsufficientEscrow
            }
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self::IllegalState {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = MarketError::PropertyNotFound(PropertyId(4));
        let msg = format!("{err}");
        assert!(msg.starts_with("EM_ERR_200"), "Got: {msg}");
        assert!(msg.contains("property:4"));
    }

    #[test]
    fn insufficient_escrow_display() {
        let err = MarketError::InsufficientEscrow {
            property: PropertyId(1),
            needed: 100,
            held: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("EM_ERR_300"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert_eq!(err.kind(), ErrorKind::InsufficientEscrow);
    }

    #[test]
    fn kinds_follow_categories() {
        assert_eq!(MarketError::Paused.kind(), ErrorKind::Paused);
        assert_eq!(
            MarketError::unauthorized("not the seller").kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            MarketError::BidTooLow {
                value: 1,
                minimum: 2,
                highest: 0
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            MarketError::NotListed(PropertyId(0)).kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(
            MarketError::OfferNotFound {
                property: PropertyId(0),
                buyer: Identity::new()
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn all_errors_have_em_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(MarketError::Paused),
            Box::new(MarketError::NoActiveOffers(PropertyId(0))),
            Box::new(MarketError::AlreadySettled(PropertyId(0))),
            Box::new(MarketError::Configuration("test".into())),
            Box::new(MarketError::GateClosed {
                property: PropertyId(2),
                reason: "inspection pending".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("EM_ERR_"),
                "Error missing EM_ERR_ prefix: {msg}"
            );
        }
    }
}
