//! Trust scoring and policy commands.

use clap::Args;
use serde::Serialize;
use voicegate::authn::{hash_pin, hash_pin_salted};
use voicegate::trust::{
    AdaptiveTrustEngine, AllowedOperations, LocationRisk, Operation, RequiredAuthentication,
    TrustAssessment, TrustLevel, TrustSignals,
};
use voicegate::Config;

use super::{output_result, print_verbose, print_warning};
use crate::Cli;

/// Score a set of trust signals.
#[derive(Args)]
pub struct AssessCommand {
    /// Background noise level, 0-1
    #[arg(long)]
    noise: f64,
    /// Voice match confidence, 0-1
    #[arg(long)]
    confidence: f64,
    /// Transaction amount
    #[arg(long)]
    amount: Option<f64>,
    /// Location risk (low, medium, high)
    #[arg(long)]
    location: Option<LocationRisk>,
}

/// Show the policy tables.
#[derive(Args)]
pub struct PolicyCommand {
    /// Only this trust level (high, medium, low, critical)
    #[arg(long)]
    level: Option<TrustLevel>,
    /// Also report whether this operation needs reverification
    #[arg(long)]
    operation: Option<Operation>,
    /// Amount for the reverification check
    #[arg(long, requires = "operation")]
    amount: Option<f64>,
}

/// Hash a PIN. Salted unless --legacy is given.
#[derive(Args)]
pub struct PinHashCommand {
    /// The PIN to hash
    pin: String,
    /// Unsalted SHA-256 (compatible with old records, not recommended)
    #[arg(long)]
    legacy: bool,
}

#[derive(Serialize)]
struct AssessOutput {
    #[serde(flatten)]
    assessment: TrustAssessment,
    required: RequiredAuthentication,
    allowed: AllowedOperations,
    private_mode: bool,
}

#[derive(Serialize)]
struct LevelPolicy {
    level: TrustLevel,
    required: RequiredAuthentication,
    allowed: AllowedOperations,
    private_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires_reverification: Option<bool>,
}

#[derive(Serialize)]
struct PinHashOutput {
    hash: String,
    salted: bool,
}

impl AssessCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let engine = AdaptiveTrustEngine::new(cfg.trust.clone())?;
        let signals = TrustSignals {
            noise_level: self.noise,
            voice_confidence: self.confidence,
            location_risk: self.location,
        };
        let assessment = engine.assess(&signals, self.amount);
        let level = assessment.trust_level;
        print_verbose(cli, &format!("Score {:.2} -> {level}", assessment.trust_score));

        output_result(
            &AssessOutput {
                required: engine.get_required_authentication(level),
                allowed: engine.get_allowed_operations(level),
                private_mode: engine.should_switch_to_private_mode(level),
                assessment,
            },
            cli.json,
        )
    }
}

impl PolicyCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let engine = AdaptiveTrustEngine::new(cfg.trust.clone())?;
        let levels = match self.level {
            Some(level) => vec![level],
            None => TrustLevel::ALL.to_vec(),
        };
        let out: Vec<LevelPolicy> = levels
            .into_iter()
            .map(|level| LevelPolicy {
                level,
                required: engine.get_required_authentication(level),
                allowed: engine.get_allowed_operations(level),
                private_mode: engine.should_switch_to_private_mode(level),
                requires_reverification: self
                    .operation
                    .map(|op| engine.requires_reverification(level, op, self.amount)),
            })
            .collect();
        output_result(&out, cli.json)
    }
}

impl PinHashCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let out = if self.legacy {
            print_warning("unsalted hashes are kept for old records only");
            PinHashOutput {
                hash: hash_pin(&self.pin),
                salted: false,
            }
        } else {
            PinHashOutput {
                hash: hash_pin_salted(&self.pin)?,
                salted: true,
            }
        };
        output_result(&out, cli.json)
    }
}
