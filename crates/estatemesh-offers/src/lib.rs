//! # estatemesh-offers
//!
//! **Offer Plane**: escrow-backed purchase offers and auction bids.
//!
//! ## Architecture
//!
//! 1. **OfferBook**: per-property offers in submission order, full history kept
//! 2. **auction**: optional bidding window; bids are flagged offer-book entries
//!
//! Every active entry has exactly its amount held in the property's escrow.
//! Opening an entry deposits; closing one either refunds the buyer or leaves
//! the funds for settlement to pay out.

pub mod auction;
pub mod offer_book;

pub use offer_book::OfferBook;
