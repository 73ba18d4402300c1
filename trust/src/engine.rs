use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::policy::{AllowedOperations, RequiredAuthentication};
use crate::{LocationRisk, Operation, TrustConfig, TrustError, TrustLevel};

const START_UNITS: i32 = 100;

/// Ambient and biometric readings for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustSignals {
    /// Background noise, 0-1.
    pub noise_level: f64,
    /// Voice match score, 0-1. Zero when identity came from a PIN.
    pub voice_confidence: f64,
    #[serde(default)]
    pub location_risk: Option<LocationRisk>,
}

impl TrustSignals {
    pub fn new(noise_level: f64, voice_confidence: f64) -> Self {
        Self {
            noise_level,
            voice_confidence,
            location_risk: None,
        }
    }

    pub fn with_location_risk(mut self, risk: LocationRisk) -> Self {
        self.location_risk = Some(risk);
        self
    }
}

/// A deduction applied during scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    HighNoise,
    LowVoiceConfidence,
    HighValueTransaction,
    HighRiskLocation,
}

impl Penalty {
    /// Deduction in hundredths.
    fn units(&self) -> i32 {
        match self {
            Self::HighNoise | Self::LowVoiceConfidence => 30,
            Self::HighValueTransaction | Self::HighRiskLocation => 20,
        }
    }

    pub fn amount(&self) -> f64 {
        f64::from(self.units()) / 100.0
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HighNoise => "high_noise",
            Self::LowVoiceConfidence => "low_voice_confidence",
            Self::HighValueTransaction => "high_value_transaction",
            Self::HighRiskLocation => "high_risk_location",
        })
    }
}

/// The inputs an assessment was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustFactors {
    pub noise_level: f64,
    pub voice_confidence: f64,
    pub transaction_amount: Option<f64>,
    pub location_risk: Option<LocationRisk>,
}

/// Result of one scoring pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub trust_score: f64,
    pub trust_level: TrustLevel,
    pub factors: TrustFactors,
    pub penalties: Vec<Penalty>,
}

/// Scores trust and answers policy questions for a trust level.
///
/// Every assessment is computed from scratch. The engine remembers the
/// most recent level only for display; no decision reads it back.
#[derive(Debug)]
pub struct AdaptiveTrustEngine {
    cfg: TrustConfig,
    current: Mutex<TrustLevel>,
}

impl AdaptiveTrustEngine {
    pub fn new(cfg: TrustConfig) -> Result<Self, TrustError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            current: Mutex::new(TrustLevel::Medium),
        })
    }

    pub fn config(&self) -> &TrustConfig {
        &self.cfg
    }

    /// Level of the most recent assessment (MEDIUM before the first one).
    pub fn current_level(&self) -> TrustLevel {
        *self.current.lock()
    }

    /// Scores `signals` plus an optional transaction amount.
    ///
    /// Each penalty is checked against its own condition. Non-finite
    /// readings count against trust.
    pub fn assess(&self, signals: &TrustSignals, transaction_amount: Option<f64>) -> TrustAssessment {
        let mut penalties = Vec::with_capacity(4);

        if !signals.noise_level.is_finite() || signals.noise_level > self.cfg.noise_threshold {
            tracing::warn!(noise_level = signals.noise_level, "trust: high noise level");
            penalties.push(Penalty::HighNoise);
        }
        if !signals.voice_confidence.is_finite()
            || signals.voice_confidence < self.cfg.biometric_threshold
        {
            tracing::warn!(voice_confidence = signals.voice_confidence, "trust: low voice confidence");
            penalties.push(Penalty::LowVoiceConfidence);
        }
        if transaction_amount.is_some_and(|a| !a.is_finite() || a > self.cfg.high_value_threshold) {
            tracing::info!(amount = ?transaction_amount, "trust: high-value transaction");
            penalties.push(Penalty::HighValueTransaction);
        }
        if signals.location_risk == Some(LocationRisk::High) {
            tracing::warn!("trust: high-risk location");
            penalties.push(Penalty::HighRiskLocation);
        }

        let units = START_UNITS - penalties.iter().map(Penalty::units).sum::<i32>();
        let level = TrustLevel::from_score_units(units);
        let score = f64::from(units) / 100.0;

        *self.current.lock() = level;
        tracing::info!(level = %level, score, "trust: level assessed");

        TrustAssessment {
            trust_score: score,
            trust_level: level,
            factors: TrustFactors {
                noise_level: signals.noise_level,
                voice_confidence: signals.voice_confidence,
                transaction_amount,
                location_risk: signals.location_risk,
            },
            penalties,
        }
    }

    /// Positional form of [`Self::assess`] returning only the level.
    pub fn assess_trust_level(
        &self,
        noise_level: f64,
        voice_confidence: f64,
        transaction_amount: Option<f64>,
        location_risk: Option<LocationRisk>,
    ) -> TrustLevel {
        let signals = TrustSignals {
            noise_level,
            voice_confidence,
            location_risk,
        };
        self.assess(&signals, transaction_amount).trust_level
    }

    pub fn get_required_authentication(&self, level: TrustLevel) -> RequiredAuthentication {
        RequiredAuthentication::for_level(level)
    }

    pub fn get_allowed_operations(&self, level: TrustLevel) -> AllowedOperations {
        AllowedOperations::for_level(level, &self.cfg)
    }

    /// Whether `operation` needs a fresh PIN/OTP before it may proceed.
    ///
    /// An amount above `require_reverification_above` always does. An
    /// operation the level forbids outright never does, since no step-up
    /// can unlock it. Otherwise only sensitive operations at LOW or
    /// CRITICAL do.
    pub fn requires_reverification(&self, level: TrustLevel, operation: Operation, amount: Option<f64>) -> bool {
        if amount.is_some_and(|a| !a.is_finite() || a > self.cfg.require_reverification_above) {
            return true;
        }
        if !self.get_allowed_operations(level).allows(operation) {
            return false;
        }
        operation.is_sensitive() && level.is_reduced()
    }

    /// Whether the conversation should move to a private channel (LOW and
    /// CRITICAL).
    pub fn should_switch_to_private_mode(&self, level: TrustLevel) -> bool {
        level.is_reduced()
    }
}
