//! Speaker verification and identification over fixed-length embeddings.
//!
//! # Pipeline
//!
//! 1. [`EmbeddingProvider::extract`]: raw audio -> embedding vector
//!    (implemented outside this crate).
//! 2. [`VoicePrintStore::enroll`]: the element-wise mean of at least two
//!    embeddings becomes the user's [`VoicePrint`].
//! 3. [`VoicePrintStore::verify`] (1:1) and [`VoicePrintStore::identify`]
//!    (1:N) score a probe with [`cosine_similarity`] against stored prints
//!    and accept at or above the configured threshold.
//! 4. [`VoicePrintStore::adaptive_update`] drifts a print toward recent
//!    samples: `(1 - w) * old + w * new`.
//!
//! Raw similarity is never calibrated or rescaled; tuning happens through
//! [`VoiceprintConfig::threshold`].

mod config;
mod cosine;
mod error;
pub mod keys;
mod model;
mod store;
mod voiceprint;

pub use config::VoiceprintConfig;
pub use cosine::{blend, cosine_similarity, mean};
pub use error::VoiceprintError;
pub use model::{EmbeddingProvider, ExtractionError};
pub use store::{Match, VoicePrintStore, Verification};
pub use voiceprint::VoicePrint;
