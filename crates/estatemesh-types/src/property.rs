//! Property records and listing parameters.
//!
//! ## Lifecycle
//!
//! ```text
//!   listProperty ┌────────┐  settlement  ┌──────┐
//!   ────────────▶│ LISTED ├─────────────▶│ SOLD │
//!                └───┬────┘              └──────┘
//!                    │ delist
//!                    ▼
//!               ┌──────────┐
//!               │ DELISTED │
//!               └──────────┘
//! ```
//!
//! Both terminal states clear `is_listed`; only settlement sets `is_sold`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Amount, BasisPoints, DocumentHash, Identity, PropertyId, Timestamp};

/// Category of real estate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
    Land,
    Apartment,
    Office,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Residential => write!(f, "RESIDENTIAL"),
            Self::Commercial => write!(f, "COMMERCIAL"),
            Self::Land => write!(f, "LAND"),
            Self::Apartment => write!(f, "APARTMENT"),
            Self::Office => write!(f, "OFFICE"),
        }
    }
}

/// Parameters a seller supplies when listing a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price: Amount,
    pub location: String,
    pub description: String,
    pub property_type: PropertyType,
    pub area: u64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Commission agent; must be authorized at listing time.
    pub agent: Option<Identity>,
    pub agent_commission: BasisPoints,
}

impl Listing {
    /// Residential listing with no agent and no size details.
    #[must_use]
    pub fn simple(price: Amount, location: impl Into<String>) -> Self {
        Self {
            price,
            location: location.into(),
            description: String::new(),
            property_type: PropertyType::Residential,
            area: 0,
            bedrooms: 0,
            bathrooms: 0,
            agent: None,
            agent_commission: BasisPoints::ZERO,
        }
    }

    #[must_use]
    pub fn with_agent(mut self, agent: Identity, commission: BasisPoints) -> Self {
        self.agent = Some(agent);
        self.agent_commission = commission;
        self
    }

    #[must_use]
    pub fn with_details(
        mut self,
        description: impl Into<String>,
        property_type: PropertyType,
        area: u64,
        bedrooms: u32,
        bathrooms: u32,
    ) -> Self {
        self.description = description.into();
        self.property_type = property_type;
        self.area = area;
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }
}

/// A property record. Single source of truth for lifecycle flags.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub seller: Identity,
    pub price: Amount,
    pub location: String,
    pub description: String,
    pub property_type: PropertyType,
    pub area: u64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub agent: Option<Identity>,
    pub agent_commission: BasisPoints,
    pub is_listed: bool,
    pub is_sold: bool,
    pub is_inspection_passed: bool,
    pub financing_approved: bool,
    /// Minimum acceptable bid for the current auction.
    pub minimum_bid: Amount,
    /// End of the bidding window; `0` means no auction.
    pub auction_end_time: Timestamp,
    pub highest_bid: Amount,
    pub highest_bidder: Option<Identity>,
    /// Bids accepted in the current auction.
    pub bid_count: u32,
    /// Set at settlement.
    pub buyer: Option<Identity>,
    /// Winning amount, set at settlement.
    pub sale_price: Option<Amount>,
    pub documents: Vec<DocumentHash>,
    pub viewers: BTreeSet<Identity>,
    pub listed_at: Timestamp,
}

impl Property {
    /// Build a freshly listed property from seller-supplied parameters.
    #[must_use]
    pub fn from_listing(id: PropertyId, seller: Identity, listing: Listing, now: Timestamp) -> Self {
        Self {
            id,
            seller,
            price: listing.price,
            location: listing.location,
            description: listing.description,
            property_type: listing.property_type,
            area: listing.area,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            agent: listing.agent,
            agent_commission: listing.agent_commission,
            is_listed: true,
            is_sold: false,
            is_inspection_passed: false,
            financing_approved: false,
            minimum_bid: 0,
            auction_end_time: 0,
            highest_bid: 0,
            highest_bidder: None,
            bid_count: 0,
            buyer: None,
            sale_price: None,
            documents: Vec::new(),
            viewers: BTreeSet::new(),
            listed_at: now,
        }
    }

    #[must_use]
    pub fn is_seller(&self, identity: Identity) -> bool {
        self.seller == identity
    }

    /// An auction has been started and not yet ended or cleared.
    #[must_use]
    pub fn has_auction(&self) -> bool {
        self.auction_end_time != 0
    }

    /// An auction exists and its bidding window is still open.
    #[must_use]
    pub fn is_auction_active(&self, now: Timestamp) -> bool {
        self.has_auction() && now < self.auction_end_time
    }

    /// Reset all auction fields.
    pub fn clear_auction(&mut self) {
        self.minimum_bid = 0;
        self.auction_end_time = 0;
        self.highest_bid = 0;
        self.highest_bidder = None;
        self.bid_count = 0;
    }

    /// Commission rate actually charged at settlement.
    #[must_use]
    pub fn effective_commission(&self) -> Option<(Identity, BasisPoints)> {
        self.agent.map(|agent| (agent, self.agent_commission))
    }

    /// `is_sold ⇒ ¬is_listed`, and a sold property records its buyer.
    #[must_use]
    pub fn lifecycle_consistent(&self) -> bool {
        if self.is_sold {
            !self.is_listed && self.buyer.is_some()
        } else {
            self.buyer.is_none()
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Property {
    pub fn dummy(id: PropertyId, seller: Identity, price: Amount) -> Self {
        Self::from_listing(id, seller, Listing::simple(price, "1 Test Lane"), 0)
    }
}
