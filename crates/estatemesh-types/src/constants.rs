//! System-wide constants for the EstateMesh marketplace engine.

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Upper bound for an agent's commission (10%).
pub const MAX_AGENT_COMMISSION_BPS: u16 = 1_000;

/// Platform fee applied at settlement unless configured otherwise (2.5%).
pub const DEFAULT_PLATFORM_FEE_BPS: u16 = 250;

/// Maximum number of document hashes attached to one property.
pub const DEFAULT_MAX_DOCUMENTS_PER_PROPERTY: usize = 256;

/// Maximum number of offer book entries (history included) per property.
pub const DEFAULT_MAX_OFFERS_PER_PROPERTY: usize = 10_000;

/// Expiry value meaning "never expires" / "no auction".
pub const NO_DEADLINE: u64 = 0;

/// Ownership token collection name.
pub const TITLE_NAME: &str = "EstateMesh Property Title";

/// Ownership token collection symbol.
pub const TITLE_SYMBOL: &str = "EMPT";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "EstateMesh";
