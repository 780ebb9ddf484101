//! Read-only auction view.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, Property, Timestamp};

/// Snapshot of a property's auction, as returned by `getAuctionDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDetails {
    /// Bidding window is open at the time of the query.
    pub is_active: bool,
    pub minimum_bid: Amount,
    /// `0` when no auction exists.
    pub end_time: Timestamp,
    pub highest_bid: Amount,
    pub highest_bidder: Option<Identity>,
    pub bid_count: u32,
}

impl AuctionDetails {
    #[must_use]
    pub fn of(property: &Property, now: Timestamp) -> Self {
        Self {
            is_active: property.is_auction_active(now),
            minimum_bid: property.minimum_bid,
            end_time: property.auction_end_time,
            highest_bid: property.highest_bid,
            highest_bidder: property.highest_bidder,
            bid_count: property.bid_count,
        }
    }
}
