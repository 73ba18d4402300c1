use thiserror::Error;
use voicegate_kv::KVError;

use crate::model::ExtractionError;

/// Errors returned by voiceprint operations.
#[derive(Debug, Error)]
pub enum VoiceprintError {
    #[error("voiceprint: not enrolled: {user_id}")]
    NotEnrolled { user_id: String },

    #[error("voiceprint: insufficient samples: need at least {required} valid, got {valid}")]
    InsufficientSamples { required: usize, valid: usize },

    #[error("voiceprint: extraction failure: {0}")]
    ExtractionFailure(#[from] ExtractionError),

    #[error("voiceprint: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("voiceprint: embedding contains non-finite values")]
    NonFiniteEmbedding,

    #[error("voiceprint: adaptive weight must be in [0, 1], got {0}")]
    InvalidWeight(f32),

    #[error("voiceprint: user id must not be empty")]
    InvalidUserId,

    #[error("voiceprint: invalid config: {0}")]
    InvalidConfig(String),

    #[error("voiceprint: no embedding provider configured")]
    NoProvider,

    #[error("voiceprint: store error: {0}")]
    Store(#[from] KVError),

    #[error("voiceprint: codec error: {0}")]
    Codec(String),
}
