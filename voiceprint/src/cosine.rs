/// Compute the cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]` where 1 means identical direction.
/// Accumulates in f64. Returns 0.0 when either vector has zero magnitude
/// the lengths differ, or the result is not finite, so a degenerate
/// probe can never clear an acceptance threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;

    for (&x, &y) in a.iter().zip(b) {
        let x = x as f64;
        let y = y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return 0.0;
    }
    // Clamp to [-1, 1] to absorb rounding.
    similarity.clamp(-1.0, 1.0) as f32
}

/// Element-wise arithmetic mean of equal-length vectors.
///
/// Returns `None` for an empty input or ragged lengths.
pub fn mean(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = vectors.first()?.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut acc = vec![0.0f64; dim];
    for v in vectors {
        for (a, &x) in acc.iter_mut().zip(v) {
            *a += x as f64;
        }
    }
    let n = vectors.len() as f64;
    Some(acc.into_iter().map(|a| (a / n) as f32).collect())
}

/// Weighted blend `(1 - weight) * old + weight * new`, component-wise.
///
/// Weight 0 returns `old` unchanged and weight 1 returns `new` exactly.
/// Lengths must match; the caller checks dimensions first.
pub fn blend(old: &[f32], new: &[f32], weight: f32) -> Vec<f32> {
    if weight <= 0.0 {
        return old.to_vec();
    }
    if weight >= 1.0 {
        return new.to_vec();
    }
    old.iter()
        .zip(new)
        .map(|(&o, &n)| (1.0 - weight) * o + weight * n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        let s = cosine_similarity(&[0.3, -1.2, 4.0], &[0.3, -1.2, 4.0]);
        assert!((s - 1.0).abs() < 1e-6, "identical: got {s}");
    }

    #[test]
    fn test_non_finite_scores_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[f32::NEG_INFINITY, 0.0]), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = [0.5, 1.5, -2.0, 0.25];
        let b = [1.0, -0.5, 0.75, 3.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_orthogonal() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(s.abs() < 1e-6, "orthogonal: got {s}");
    }

    #[test]
    fn test_opposite() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((s + 1.0).abs() < 1e-6, "opposite: got {s}");
    }

    #[test]
    fn test_scale_invariant() {
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_mean() {
        let m = mean(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(m, vec![2.0, 4.0]);
        assert!(mean(&[]).is_none());
        assert!(mean(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn test_blend_endpoints() {
        let old = [0.1, 0.7, -0.3];
        let new = [0.9, -0.2, 0.5];
        assert_eq!(blend(&old, &new, 0.0), old.to_vec());
        assert_eq!(blend(&old, &new, 1.0), new.to_vec());

        let half = blend(&[0.0, 2.0], &[2.0, 0.0], 0.5);
        assert_eq!(half, vec![1.0, 1.0]);
    }
}
