//! Marketplace configuration.

use serde::{Deserialize, Serialize};

use crate::{BasisPoints, MarketError, Result, constants};

/// Engine-wide settings fixed at initialization. The platform fee can later
/// be changed by the owner; the limits cannot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Fee charged at every settlement, paid to the platform owner.
    pub platform_fee_bps: BasisPoints,
    /// Ceiling on an agent's commission at listing time.
    pub max_agent_commission_bps: BasisPoints,
    /// Document hashes a single property may carry.
    pub max_documents_per_property: usize,
    /// Active offer book entries a single property may carry. Closed
    /// entries stay in the history and do not count.
    pub max_offers_per_property: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            platform_fee_bps: BasisPoints(constants::DEFAULT_PLATFORM_FEE_BPS),
            max_agent_commission_bps: BasisPoints(constants::MAX_AGENT_COMMISSION_BPS),
            max_documents_per_property: constants::DEFAULT_MAX_DOCUMENTS_PER_PROPERTY,
            max_offers_per_property: constants::DEFAULT_MAX_OFFERS_PER_PROPERTY,
        }
    }
}

impl MarketConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is within its allowed range.
    ///
    /// # Errors
    /// Returns `Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.platform_fee_bps.is_valid_fraction() {
            return Err(MarketError::Configuration(format!(
                "platform_fee_bps {} exceeds {}",
                self.platform_fee_bps,
                BasisPoints::FULL
            )));
        }
        if self.max_agent_commission_bps.value() > constants::MAX_AGENT_COMMISSION_BPS {
            return Err(MarketError::Configuration(format!(
                "max_agent_commission_bps {} exceeds {}bps",
                self.max_agent_commission_bps,
                constants::MAX_AGENT_COMMISSION_BPS
            )));
        }
        if !self.platform_fee_bps.fits_with(self.max_agent_commission_bps) {
            return Err(MarketError::Configuration(format!(
                "platform_fee_bps {} plus max_agent_commission_bps {} exceeds {}",
                self.platform_fee_bps,
                self.max_agent_commission_bps,
                BasisPoints::FULL
            )));
        }
        if self.max_documents_per_property == 0 || self.max_offers_per_property == 0 {
            return Err(MarketError::Configuration(
                "per-property limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MarketConfig::default();
        assert_eq!(cfg.platform_fee_bps, BasisPoints(250));
        assert_eq!(cfg.max_agent_commission_bps, BasisPoints(1_000));
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg = MarketConfig::from_json(r#"{"platform_fee_bps": 100}"#).unwrap();
        assert_eq!(cfg.platform_fee_bps, BasisPoints(100));
        assert_eq!(
            cfg.max_documents_per_property,
            constants::DEFAULT_MAX_DOCUMENTS_PER_PROPERTY
        );
    }

    #[test]
    fn out_of_range_fee_rejected() {
        let err = MarketConfig::from_json(r#"{"platform_fee_bps": 10001}"#).unwrap_err();
        assert!(matches!(err, MarketError::Configuration(_)));

        let err = MarketConfig::from_json(r#"{"max_agent_commission_bps": 1500}"#).unwrap_err();
        assert!(matches!(err, MarketError::Configuration(_)));
    }

    #[test]
    fn fee_and_commission_ceiling_must_fit_together() {
        let err = MarketConfig::from_json(r#"{"platform_fee_bps": 9500}"#).unwrap_err();
        assert!(matches!(err, MarketError::Configuration(_)));

        let cfg = MarketConfig::from_json(r#"{"platform_fee_bps": 9000}"#).unwrap();
        assert_eq!(cfg.platform_fee_bps, BasisPoints(9_000));

        let cfg = MarketConfig::from_json(
            r#"{"platform_fee_bps": 9500, "max_agent_commission_bps": 500}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_agent_commission_bps, BasisPoints(500));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = MarketConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, MarketError::Serialization(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = MarketConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MarketConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
