use serde::{Deserialize, Serialize};

use crate::VoiceprintError;

/// Tuning knobs for [`crate::VoicePrintStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceprintConfig {
    /// Minimum cosine similarity to accept a probe (default: 0.85).
    pub threshold: f32,

    /// Weight of the new sample in adaptive updates (default: 0.1).
    pub update_weight: f32,

    /// Minimum number of valid embeddings to enroll (default: 2).
    pub min_samples: usize,

    /// Enrollment below this count succeeds but logs a warning (default: 3).
    pub recommended_samples: usize,

    /// Fixed embedding dimension. When unset, the provider's dimension or
    /// the first stored print decides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// 1:N identification is rejected as ambiguous when the runner-up
    /// scores within this margin of the best candidate (default: 0.0,
    /// i.e. exact ties only).
    pub tie_margin: f32,
}

impl Default for VoiceprintConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            update_weight: 0.1,
            min_samples: 2,
            recommended_samples: 3,
            dimension: None,
            tie_margin: 0.0,
        }
    }
}

impl VoiceprintConfig {
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        if !self.threshold.is_finite() {
            return Err(VoiceprintError::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if !(self.update_weight > 0.0 && self.update_weight <= 1.0) {
            return Err(VoiceprintError::InvalidWeight(self.update_weight));
        }
        if self.min_samples < 2 {
            return Err(VoiceprintError::InvalidConfig(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        if self.dimension == Some(0) {
            return Err(VoiceprintError::InvalidConfig("dimension must be positive".into()));
        }
        if !self.tie_margin.is_finite() || self.tie_margin < 0.0 {
            return Err(VoiceprintError::InvalidConfig(format!(
                "tie_margin must be a non-negative number, got {}",
                self.tie_margin
            )));
        }
        Ok(())
    }
}
