use thiserror::Error;
use voicegate_authn::AuthError;
use voicegate_kv::KVError;
use voicegate_trust::TrustError;
use voicegate_voiceprint::VoiceprintError;

use crate::ConfigError;

/// Faults surfaced by the gate. Policy outcomes (denial, step-up) are
/// [`crate::Decision`] values, not errors.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("gate: per-call assessment needs trust signals on the request")]
    MissingSignals,

    #[error(transparent)]
    Voiceprint(#[from] VoiceprintError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    #[error(transparent)]
    Store(#[from] KVError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
