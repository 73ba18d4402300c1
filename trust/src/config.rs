use serde::{Deserialize, Serialize};

use crate::TrustError;

/// Thresholds for trust scoring and transaction policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Ambient noise (0-1) above which the environment counts as noisy.
    pub noise_threshold: f64,
    /// Voice match confidence below which the biometric counts as weak.
    pub biometric_threshold: f64,
    /// Amount above which a transaction is high-value. Also the MEDIUM
    /// transaction ceiling.
    pub high_value_threshold: f64,
    /// Transaction ceiling at LOW trust.
    pub default_transaction_limit: f64,
    /// Amount above which every operation needs a step-up, at any level.
    pub require_reverification_above: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 0.3,
            biometric_threshold: 0.85,
            high_value_threshold: 25_000.0,
            default_transaction_limit: 10_000.0,
            require_reverification_above: 25_000.0,
        }
    }
}

impl TrustConfig {
    pub fn validate(&self) -> Result<(), TrustError> {
        let fields = [
            ("noise_threshold", self.noise_threshold),
            ("biometric_threshold", self.biometric_threshold),
            ("high_value_threshold", self.high_value_threshold),
            ("default_transaction_limit", self.default_transaction_limit),
            ("require_reverification_above", self.require_reverification_above),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(TrustError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = TrustConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.noise_threshold, 0.3);
        assert_eq!(cfg.require_reverification_above, 25_000.0);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: TrustConfig = serde_yaml::from_str("high_value_threshold: 50000\n").unwrap();
        assert_eq!(cfg.high_value_threshold, 50_000.0);
        assert_eq!(cfg.biometric_threshold, 0.85);
    }

    #[test]
    fn rejects_nan_and_negative() {
        let cfg = TrustConfig {
            noise_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = TrustConfig {
            default_transaction_limit: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
