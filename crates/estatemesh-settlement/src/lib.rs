//! # estatemesh-settlement
//!
//! **Finality Plane**: turns a chosen winning offer into a completed sale.
//!
//! ## Architecture
//!
//! The settler receives a property and the index of its winning offer and:
//! 1. Enforces the gates (listed, unsold, inspection, financing)
//! 2. Splits the amount into platform fee, agent commission, seller proceeds
//! 3. Releases escrow and transfers the ownership title
//! 4. Refunds every competing offer
//! 5. Records the property as settled so it can never settle twice
//!
//! Payout dispatch is not done here. The engine dispatches the returned
//! payouts under the [`SettlementGuard`] in-flight lock once every state
//! change has been committed, and [`conservation`] verifies escrow still
//! backs the remaining offers.

pub mod conservation;
pub mod fee_split;
pub mod guard;
pub mod settler;

pub use conservation::{verify_escrow, verify_market};
pub use fee_split::FeeSplit;
pub use guard::SettlementGuard;
pub use settler::{SettlementLedgers, SettlementOutcome, Settler};
