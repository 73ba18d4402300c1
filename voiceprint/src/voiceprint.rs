use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::VoiceprintError;

/// The stored embedding representing one enrolled user's voice.
///
/// At most one print exists per user; enrollment overwrites, adaptive
/// update mutates it in place.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePrint {
    pub user_id: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VoicePrint {
    pub fn new(user_id: impl Into<String>, embedding: Vec<f32>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            embedding,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Encodes the print as MessagePack. `f32` components are written as
    /// 32-bit floats, so decoding yields bit-identical values.
    pub fn encode(&self) -> Result<Vec<u8>, VoiceprintError> {
        rmp_serde::to_vec_named(self).map_err(|e| VoiceprintError::Codec(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, VoiceprintError> {
        rmp_serde::from_slice(data).map_err(|e| VoiceprintError::Codec(e.to_string()))
    }

    /// SHA-256 over the little-endian embedding bytes, hex encoded.
    ///
    /// Stable identifier for logs and listings that does not expose the
    /// biometric data itself.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for v in &self.embedding {
            hasher.update(v.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for VoicePrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePrint")
            .field("user_id", &self.user_id)
            .field("dimension", &self.embedding.len())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VoicePrint {
        VoicePrint::new(
            "user001",
            vec![0.1, -0.333_333_34, 1.0e-7, 12345.678, f32::MIN_POSITIVE],
            Utc::now(),
        )
    }

    #[test]
    fn codec_round_trip_is_exact() {
        let vp = sample();
        let decoded = VoicePrint::decode(&vp.encode().unwrap()).unwrap();
        assert_eq!(decoded.user_id, vp.user_id);
        assert_eq!(decoded.created_at, vp.created_at);
        for (a, b) in vp.embedding.iter().zip(&decoded.embedding) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn decode_garbage_is_codec_error() {
        assert!(matches!(
            VoicePrint::decode(b"\xc1not msgpack"),
            Err(VoiceprintError::Codec(_))
        ));
    }

    #[test]
    fn fingerprint_tracks_embedding() {
        let a = sample();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.embedding[0] = 0.2;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn debug_hides_embedding() {
        let s = format!("{:?}", sample());
        assert!(s.contains("dimension: 5"));
        assert!(!s.contains("12345"));
    }
}
