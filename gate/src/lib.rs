//! Voice-biometric login and trust-gated authorization for voice banking.
//!
//! [`AuthorizationGate`] ties the pieces together:
//!
//! ```text
//! probe embedding -> VoicePrintStore::identify -> match score
//!                 -> AdaptiveTrustEngine::assess (noise, location, amount)
//!                 -> AuthenticationManager::create_session
//!
//! request(token, operation, amount)
//!                 -> session check -> trust assessment
//!                 -> Approved | StepUpRequired | Denied(reason)
//! ```
//!
//! The component crates are re-exported so callers need only this one.

mod config;
mod error;
mod gate;
mod logging;


pub use config::{AssessmentMode, Config, ConfigError, GateConfig, LogConfig, StorageConfig};
pub use error::GateError;
pub use gate::{
    AuthorizationGate, AuthorizationRequest, Decision, DenialReason, PinEvidence, PinLogin,
    StepUpReason, VoiceLogin,
};
pub use logging::init_logging;

pub use voicegate_authn as authn;
pub use voicegate_kv as kv;
pub use voicegate_trust as trust;
pub use voicegate_voiceprint as voiceprint;
