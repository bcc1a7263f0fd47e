//! Pluggable scalar scoring of state vectors.

use crate::memory::vector::magnitude;

/// Scores a state vector; higher is better.
pub trait PerformanceScorer: Send + Sync {
    fn score(&self, state: &[f64]) -> f64;
}

/// Vector magnitude as a performance proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeScorer;

impl PerformanceScorer for MagnitudeScorer {
    fn score(&self, state: &[f64]) -> f64 {
        magnitude(state)
    }
}

impl<F> PerformanceScorer for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn score(&self, state: &[f64]) -> f64 {
        self(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_scorer() {
        assert_eq!(MagnitudeScorer.score(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_closure_scorer() {
        let sum = |state: &[f64]| state.iter().sum::<f64>();
        assert_eq!(sum.score(&[1.0, 2.0, 3.0]), 6.0);
    }
}
