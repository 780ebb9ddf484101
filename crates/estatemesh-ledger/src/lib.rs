//! # estatemesh-ledger
//!
//! **Ledger Plane**: who may do what, what exists, who holds title, and
//! where the money sits.
//!
//! ## Architecture
//!
//! 1. **AccessControl**: owner, appraiser, authorized agents (pure predicates)
//! 2. **PropertyRegistry**: dense, sequential property records
//! 3. **TitleRegistry**: one non-duplicable ownership token per property
//! 4. **EscrowLedger**: per-property held balances; release/refund yield payouts
//! 5. **PayoutRail**: where committed payouts are dispatched, always last
//!
//! ## Fund Flow
//!
//! ```text
//! offer/bid → EscrowLedger.deposit()
//!           → EscrowLedger.release()/refund() → Vec<Payout>
//!           → (state committed) → PayoutRail.dispatch()
//! ```

pub mod access_control;
pub mod escrow;
pub mod payout_rail;
pub mod registry;
pub mod title;

pub use access_control::AccessControl;
pub use escrow::{EscrowAccount, EscrowLedger};
pub use payout_rail::{PayoutLedger, PayoutRail};
pub use registry::PropertyRegistry;
pub use title::TitleRegistry;
