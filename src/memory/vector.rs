//! Small dense-vector helpers shared by the fusion operator.

use crate::error::{ControllerError, Result};

/// Fail with `ShapeMismatch` unless both vectors share a dimension.
pub fn ensure_same_dimension(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ControllerError::ShapeMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Euclidean (L2) norm.
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity, `1 − cosine_distance`, in [−1, 1].
///
/// A zero vector has no direction; its similarity to anything is 0.
/// Callers must check dimensions first.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-12 || !denom.is_finite() {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Elementwise product scaled by `1 / (|a|·|b|)`; zeros if either is zero.
pub fn interaction_term(a: &[f64], b: &[f64]) -> Vec<f64> {
    let denom = magnitude(a) * magnitude(b);
    if denom < 1e-12 || !denom.is_finite() {
        return vec![0.0; a.len()];
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y / denom).collect()
}
