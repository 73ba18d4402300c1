use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use voicegate_kv::KVStore;

use crate::config::VoiceprintConfig;
use crate::cosine::{blend, cosine_similarity, mean};
use crate::error::VoiceprintError;
use crate::keys::{print_key, user_id_from_key, PRINT_PREFIX};
use crate::model::EmbeddingProvider;
use crate::voiceprint::VoicePrint;

/// Result of a 1:1 verification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    /// True iff `score >= threshold`.
    pub accepted: bool,
    /// Raw cosine similarity between probe and stored print.
    pub score: f32,
    /// Threshold the score was compared against.
    pub threshold: f32,
}

/// Best candidate of a 1:N identification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub user_id: String,
    pub score: f32,
}

/// Durable per-user voice prints with 1:1 and 1:N matching.
///
/// Mutations (enroll, adaptive update, delete) go through a single writer
/// lock so read-modify-write sequences are atomic per user. Reads go
/// straight to the KV store.
pub struct VoicePrintStore {
    kv: Arc<dyn KVStore>,
    cfg: VoiceprintConfig,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    writer: Mutex<()>,
    dimension: RwLock<Option<usize>>,
}

impl VoicePrintStore {
    /// Creates a store over `kv`. Fails if the configuration is invalid.
    pub fn new(kv: Arc<dyn KVStore>, cfg: VoiceprintConfig) -> Result<Self, VoiceprintError> {
        cfg.validate()?;
        let dimension = RwLock::new(cfg.dimension);
        Ok(Self {
            kv,
            cfg,
            provider: None,
            writer: Mutex::new(()),
            dimension,
        })
    }

    /// Attaches the embedding provider used by the `*_audio` operations.
    ///
    /// Fails if the provider's dimension disagrees with a configured one.
    pub fn with_provider(
        self,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VoiceprintError> {
        let dim = provider.dimension();
        if dim == 0 {
            return Err(VoiceprintError::InvalidConfig(
                "provider dimension must be positive".into(),
            ));
        }
        {
            let mut known = self.dimension.write();
            match *known {
                Some(expected) if expected != dim => {
                    return Err(VoiceprintError::DimensionMismatch { expected, got: dim });
                }
                _ => *known = Some(dim),
            }
        }
        Ok(Self {
            provider: Some(provider),
            ..self
        })
    }

    pub fn config(&self) -> &VoiceprintConfig {
        &self.cfg
    }

    pub fn threshold(&self) -> f32 {
        self.cfg.threshold
    }

    /// Enrolls `user_id` from already-extracted embeddings.
    ///
    /// Empty or non-finite embeddings count as invalid and are skipped.
    /// The stored print is the element-wise mean of the valid ones and
    /// replaces any previous print for the user.
    pub fn enroll(
        &self,
        user_id: &str,
        samples: &[Vec<f32>],
    ) -> Result<VoicePrint, VoiceprintError> {
        check_user_id(user_id)?;
        if samples.len() < self.cfg.recommended_samples {
            tracing::warn!(
                user_id,
                supplied = samples.len(),
                recommended = self.cfg.recommended_samples,
                "voiceprint: fewer enrollment samples than recommended"
            );
        }

        let valid: Vec<Vec<f32>> = samples
            .iter()
            .filter(|s| is_valid_embedding(s))
            .cloned()
            .collect();
        if valid.len() < samples.len() {
            tracing::warn!(
                user_id,
                skipped = samples.len() - valid.len(),
                "voiceprint: skipped invalid enrollment samples"
            );
        }
        self.store_mean(user_id, valid)
    }

    /// Enrolls `user_id` from raw audio clips through the provider.
    ///
    /// Clips the provider rejects are skipped; enrollment still needs
    /// `min_samples` successful extractions.
    pub fn enroll_audio(
        &self,
        user_id: &str,
        clips: &[&[f32]],
        sample_rate: u32,
    ) -> Result<VoicePrint, VoiceprintError> {
        check_user_id(user_id)?;
        let provider = self.provider()?;
        if clips.len() < self.cfg.recommended_samples {
            tracing::warn!(
                user_id,
                supplied = clips.len(),
                recommended = self.cfg.recommended_samples,
                "voiceprint: fewer enrollment samples than recommended"
            );
        }

        let mut valid = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            match provider.extract(clip, sample_rate) {
                Ok(emb) if is_valid_embedding(&emb) => valid.push(emb),
                Ok(_) => {
                    tracing::warn!(user_id, sample = i, "voiceprint: provider returned a degenerate embedding")
                }
                Err(e) => {
                    tracing::warn!(user_id, sample = i, error = %e, "voiceprint: extraction failed, skipping sample")
                }
            }
        }
        self.store_mean(user_id, valid)
    }

    fn store_mean(
        &self,
        user_id: &str,
        valid: Vec<Vec<f32>>,
    ) -> Result<VoicePrint, VoiceprintError> {
        if valid.len() < self.cfg.min_samples {
            tracing::error!(
                user_id,
                valid = valid.len(),
                required = self.cfg.min_samples,
                "voiceprint: not enough valid samples for enrollment"
            );
            return Err(VoiceprintError::InsufficientSamples {
                required: self.cfg.min_samples,
                valid: valid.len(),
            });
        }

        let dim = valid[0].len();
        if let Some(bad) = valid.iter().find(|v| v.len() != dim) {
            return Err(VoiceprintError::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }

        let _guard = self.writer.lock();
        self.check_dimension(dim)?;
        let embedding = mean(&valid).ok_or(VoiceprintError::DimensionMismatch {
            expected: dim,
            got: 0,
        })?;

        let print = VoicePrint::new(user_id, embedding, Utc::now());
        self.kv.set(&print_key(user_id), &print.encode()?)?;
        {
            let mut known = self.dimension.write();
            if known.is_none() {
                *known = Some(dim);
            }
        }

        tracing::info!(
            user_id,
            samples = valid.len(),
            fingerprint = %short(&print.fingerprint()),
            "voiceprint: user enrolled"
        );
        Ok(print)
    }

    /// 1:1 verification of a claimed identity.
    pub fn verify(&self, user_id: &str, probe: &[f32]) -> Result<Verification, VoiceprintError> {
        check_user_id(user_id)?;
        let stored = self
            .get(user_id)?
            .ok_or_else(|| not_enrolled(user_id))?;
        self.check_probe(probe, stored.dimension())?;

        let score = cosine_similarity(&stored.embedding, probe);
        let accepted = score >= self.cfg.threshold;
        tracing::info!(user_id, accepted, score, "voiceprint: verification");
        Ok(Verification {
            accepted,
            score,
            threshold: self.cfg.threshold,
        })
    }

    /// [`Self::verify`] on raw audio. Extraction failure propagates.
    pub fn verify_audio(
        &self,
        user_id: &str,
        audio: &[f32],
        sample_rate: u32,
    ) -> Result<Verification, VoiceprintError> {
        let probe = self.provider()?.extract(audio, sample_rate)?;
        self.verify(user_id, &probe)
    }

    /// 1:N identification against every stored print.
    ///
    /// Returns `None` when no print reaches the threshold, or when the
    /// runner-up is within `tie_margin` of the best candidate. Prints are
    /// scanned in user-id order, so results are reproducible.
    pub fn identify(&self, probe: &[f32]) -> Result<Option<Match>, VoiceprintError> {
        let prints = self.list()?;
        if let Some(first) = prints.first() {
            self.check_probe(probe, first.dimension())?;
        }

        let mut best: Option<Match> = None;
        let mut runner_up = f32::NEG_INFINITY;
        for print in prints {
            let score = cosine_similarity(&print.embedding, probe);
            match &best {
                Some(b) if score <= b.score => runner_up = runner_up.max(score),
                _ => {
                    if let Some(b) = &best {
                        runner_up = runner_up.max(b.score);
                    }
                    best = Some(Match {
                        user_id: print.user_id,
                        score,
                    });
                }
            }
        }

        let Some(best) = best else {
            tracing::debug!("voiceprint: identify on empty store");
            return Ok(None);
        };
        if best.score < self.cfg.threshold {
            tracing::info!(best_score = best.score, "voiceprint: no matching user");
            return Ok(None);
        }
        if best.score - runner_up <= self.cfg.tie_margin {
            tracing::warn!(
                best_score = best.score,
                runner_up,
                tie_margin = self.cfg.tie_margin,
                "voiceprint: ambiguous identification rejected"
            );
            return Ok(None);
        }

        tracing::info!(user_id = %best.user_id, score = best.score, "voiceprint: user identified");
        Ok(Some(best))
    }

    /// [`Self::identify`] on raw audio. Extraction failure propagates.
    pub fn identify_audio(
        &self,
        audio: &[f32],
        sample_rate: u32,
    ) -> Result<Option<Match>, VoiceprintError> {
        let probe = self.provider()?.extract(audio, sample_rate)?;
        self.identify(&probe)
    }

    /// Blends `new_embedding` into the stored print with the configured
    /// default weight.
    pub fn adaptive_update(
        &self,
        user_id: &str,
        new_embedding: &[f32],
    ) -> Result<VoicePrint, VoiceprintError> {
        self.adaptive_update_with(user_id, new_embedding, self.cfg.update_weight)
    }

    /// Replaces the stored embedding with
    /// `(1 - weight) * old + weight * new`.
    ///
    /// `weight` must lie in `[0, 1]`; 0 keeps the print as is, 1 replaces it.
    pub fn adaptive_update_with(
        &self,
        user_id: &str,
        new_embedding: &[f32],
        weight: f32,
    ) -> Result<VoicePrint, VoiceprintError> {
        check_user_id(user_id)?;
        if !(0.0..=1.0).contains(&weight) {
            return Err(VoiceprintError::InvalidWeight(weight));
        }

        let _guard = self.writer.lock();
        let mut print = self
            .get(user_id)?
            .ok_or_else(|| not_enrolled(user_id))?;
        self.check_probe(new_embedding, print.dimension())?;

        print.embedding = blend(&print.embedding, new_embedding, weight);
        print.updated_at = Utc::now();
        self.kv.set(&print_key(user_id), &print.encode()?)?;

        tracing::info!(
            user_id,
            weight,
            fingerprint = %short(&print.fingerprint()),
            "voiceprint: print updated"
        );
        Ok(print)
    }

    /// [`Self::adaptive_update`] on raw audio.
    pub fn adaptive_update_audio(
        &self,
        user_id: &str,
        audio: &[f32],
        sample_rate: u32,
    ) -> Result<VoicePrint, VoiceprintError> {
        let emb = self.provider()?.extract(audio, sample_rate)?;
        self.adaptive_update(user_id, &emb)
    }

    /// Removes a user's print. Returns whether one existed.
    pub fn delete(&self, user_id: &str) -> Result<bool, VoiceprintError> {
        check_user_id(user_id)?;
        let _guard = self.writer.lock();
        let removed = self.kv.delete(&print_key(user_id))?;
        if removed {
            tracing::info!(user_id, "voiceprint: print deleted");
        } else {
            tracing::debug!(user_id, "voiceprint: delete on missing print");
        }
        Ok(removed)
    }

    pub fn get(&self, user_id: &str) -> Result<Option<VoicePrint>, VoiceprintError> {
        match self.kv.get(&print_key(user_id))? {
            Some(data) => Ok(Some(VoicePrint::decode(&data)?)),
            None => Ok(None),
        }
    }

    /// All stored prints, ordered by user id.
    pub fn list(&self) -> Result<Vec<VoicePrint>, VoiceprintError> {
        let entries = self.kv.scan(PRINT_PREFIX)?;
        let mut prints = Vec::with_capacity(entries.len());
        for (key, data) in entries {
            let print = VoicePrint::decode(&data)?;
            if user_id_from_key(&key) != Some(print.user_id.as_str()) {
                tracing::warn!(key = %key, "voiceprint: key does not match stored user id");
            }
            prints.push(print);
        }
        Ok(prints)
    }

    /// True when nobody is enrolled yet.
    pub fn is_empty(&self) -> Result<bool, VoiceprintError> {
        Ok(self.kv.scan(PRINT_PREFIX)?.is_empty())
    }

    fn provider(&self) -> Result<&Arc<dyn EmbeddingProvider>, VoiceprintError> {
        self.provider.as_ref().ok_or(VoiceprintError::NoProvider)
    }

    /// Checks an enrollment dimension against the deployment-wide one,
    /// learning it from the first stored print when not configured.
    fn check_dimension(&self, got: usize) -> Result<(), VoiceprintError> {
        let known = *self.dimension.read();
        let expected = match known {
            Some(d) => Some(d),
            None => {
                let first = self.kv.scan(PRINT_PREFIX)?.into_iter().next();
                match first {
                    Some((_, data)) => {
                        let d = VoicePrint::decode(&data)?.dimension();
                        *self.dimension.write() = Some(d);
                        Some(d)
                    }
                    None => None,
                }
            }
        };
        match expected {
            Some(expected) if expected != got => {
                Err(VoiceprintError::DimensionMismatch { expected, got })
            }
            _ => Ok(()),
        }
    }

    fn check_probe(&self, probe: &[f32], expected: usize) -> Result<(), VoiceprintError> {
        if probe.len() != expected {
            return Err(VoiceprintError::DimensionMismatch {
                expected,
                got: probe.len(),
            });
        }
        if !is_valid_embedding(probe) {
            return Err(VoiceprintError::NonFiniteEmbedding);
        }
        Ok(())
    }
}

fn check_user_id(user_id: &str) -> Result<(), VoiceprintError> {
    if user_id.trim().is_empty() {
        return Err(VoiceprintError::InvalidUserId);
    }
    Ok(())
}

fn is_valid_embedding(emb: &[f32]) -> bool {
    !emb.is_empty() && emb.iter().all(|v| v.is_finite())
}

fn not_enrolled(user_id: &str) -> VoiceprintError {
    tracing::warn!(user_id, "voiceprint: no voice print found");
    VoiceprintError::NotEnrolled {
        user_id: user_id.to_string(),
    }
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}
