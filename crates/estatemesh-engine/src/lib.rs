//! # estatemesh-engine
//!
//! The **EstateMesh** peer-to-peer property marketplace engine.
//!
//! [`Marketplace`] owns every ledger and exposes each public operation as a
//! single atomic call taking the caller identity explicitly:
//!
//! - [`listing`]: list, edit, inspect, finance, delist, emergency drain
//! - [`trading`]: submit, accept, reject, expire and reclaim offers
//! - [`bidding`]: start, bid on and end auctions
//!
//! ## Sale Lifecycle
//!
//! ```text
//!  list ──▶ LISTED ──offers/bids──▶ (escrow held)
//!             │                          │
//!             │ delist                   │ accept / end auction
//!             ▼                          ▼   gates: inspection ∧ financing
//!         DELISTED                  SOLD (fees split, title moved,
//!        (all refunded)                   losers refunded)
//! ```
//!
//! Every successful mutating call appends [`MarketEvent`]s to the
//! notification log; failed calls leave no trace.
//!
//! [`MarketEvent`]: estatemesh_types::MarketEvent

pub mod bidding;
pub mod listing;
pub mod marketplace;
pub mod trading;

pub use marketplace::Marketplace;
