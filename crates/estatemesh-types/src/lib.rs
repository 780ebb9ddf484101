//! # estatemesh-types
//!
//! Shared types, errors, and configuration for the **EstateMesh** property
//! marketplace engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Identity`], [`PropertyId`], [`DocumentHash`]
//! - **Amounts**: [`Amount`], [`BasisPoints`], [`Timestamp`]
//! - **Property model**: [`Property`], [`PropertyType`], [`Listing`]
//! - **Offer model**: [`Offer`], [`OfferOutcome`]
//! - **Auction view**: [`AuctionDetails`]
//! - **Payouts**: [`Payout`], [`PayoutReason`]
//! - **Notifications**: [`MarketEvent`]
//! - **Configuration**: [`MarketConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`MarketError`] with `EM_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod auction;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod payout;
pub mod property;

// Re-export all primary types at crate root for ergonomic imports:
//   use estatemesh_types::{Property, Offer, Identity, ...};

pub use amount::*;
pub use auction::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;
pub use payout::*;
pub use property::*;

// Constants are accessed via `estatemesh_types::constants::FOO`
// (not re-exported to avoid name collisions).
