use thiserror::Error;

/// Failure reported by an [`EmbeddingProvider`].
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort { min_samples: usize, got_samples: usize },

    #[error("unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("model error: {0}")]
    Model(String),
}

/// Turns raw audio into a speaker embedding.
///
/// The acoustic pipeline lives outside this crate; the store only relies
/// on this contract. Output length must always equal
/// [`EmbeddingProvider::dimension`], and the same audio must produce the
/// same vector for a given model version.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait EmbeddingProvider: Send + Sync {
    /// Computes a speaker embedding from mono samples in `[-1, 1]`.
    fn extract(&self, audio: &[f32], sample_rate: u32) -> Result<Vec<f32>, ExtractionError>;

    /// Returns the dimensionality of the embedding vectors (e.g., 192).
    fn dimension(&self) -> usize;
}
