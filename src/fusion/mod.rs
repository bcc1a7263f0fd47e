//! Meta-entropy fusion window.
//!
//! A bounded FIFO of recent scalar signals. The window's meta-entropy
//! (entropy of the normalised magnitudes of its history) measures how
//! volatile the signal has been, and dampens the fused value:
//!
//! ```text
//! fuse(a, b):  window ← a
//!              F = (a − b) − T · meta_entropy(window)
//!              return tanh(F)            ∈ [−1, 1]
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::WindowConfig;
use crate::error::{ControllerError, Result};

/// Stabiliser added inside the logarithm so zero probabilities stay finite.
pub const LOG_STABILIZER: f64 = 1e-10;

/// Threshold reported until the window holds enough samples.
pub const DEFAULT_DYNAMIC_THRESHOLD: f64 = 0.5;

/// Scale applied to the window mean to derive the dynamic threshold.
pub const THRESHOLD_SCALE: f64 = 0.7;

/// Largest accepted window capacity.
pub const MAX_WINDOW_CAPACITY: usize = 10_000;

/// Bounded history of recent signals plus the fusion temperature.
///
/// Owned by exactly one session; only [`FusionWindow::update`] (directly or
/// through [`FusionWindow::fuse`]) mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    temperature: f64,
}

impl FusionWindow {
    /// Create an empty window.
    ///
    /// Fails with `Config` when `capacity` is outside `1..=MAX_WINDOW_CAPACITY`
    /// or `temperature` is negative or non-finite.
    pub fn new(capacity: usize, temperature: f64) -> Result<Self> {
        if capacity == 0 || capacity > MAX_WINDOW_CAPACITY {
            return Err(ControllerError::config(format!(
                "fusion window capacity must be between 1 and {} (got {})",
                MAX_WINDOW_CAPACITY, capacity
            )));
        }
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(ControllerError::config(format!(
                "fusion temperature must be finite and non-negative (got {})",
                temperature
            )));
        }
        Ok(Self {
            samples: VecDeque::new(),
            capacity,
            temperature,
        })
    }

    /// Create a window from its configuration block.
    pub fn from_config(config: &WindowConfig) -> Result<Self> {
        Self::new(config.capacity, config.temperature)
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fusion temperature `T`.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Append a sample, evicting the oldest one when over capacity.
    pub fn update(&mut self, value: f64) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Natural-log entropy of the normalised sample magnitudes.
    ///
    /// Zero with fewer than two samples or when every sample is zero.
    pub fn meta_entropy(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(|v| v.abs()).sum();
        if total == 0.0 || !total.is_finite() {
            return 0.0;
        }
        self.samples
            .iter()
            .map(|v| {
                let p = v.abs() / total;
                -p * (p + LOG_STABILIZER).ln()
            })
            .sum::<f64>()
            .max(0.0)
    }

    /// Fuse two signals into a bounded scalar.
    ///
    /// Only `a` enters the history. The instantaneous gap `a − b` is damped by
    /// `T · meta_entropy` and squashed through `tanh`.
    pub fn fuse(&mut self, a: f64, b: f64) -> f64 {
        self.update(a);
        let meta = self.meta_entropy();
        let raw = (a - b) - self.temperature * meta;
        let fused = raw.tanh();
        log::debug!(
            "fusion window: a={:.4} b={:.4} meta={:.4} raw={:.4} fused={:.4}",
            a,
            b,
            meta,
            raw,
            fused
        );
        fused
    }

    /// Significance threshold derived from recent history.
    ///
    /// `mean(window) · 0.7` once three samples exist, otherwise 0.5.
    pub fn dynamic_threshold(&self) -> f64 {
        if self.samples.len() < 3 {
            return DEFAULT_DYNAMIC_THRESHOLD;
        }
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        mean * THRESHOLD_SCALE
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for FusionWindow {
    fn default() -> Self {
        let config = WindowConfig::default();
        Self {
            samples: VecDeque::new(),
            capacity: config.capacity,
            temperature: config.temperature,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction_preserves_order() {
        let mut window = FusionWindow::new(3, 1.0).unwrap();
        for v in [0.2, 0.4, 0.9, 0.1] {
            window.update(v);
        }
        assert_eq!(window.samples(), vec![0.4, 0.9, 0.1]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = FusionWindow::new(5, 0.5).unwrap();
        for i in 0..50 {
            window.update(i as f64);
            assert!(window.len() <= 5);
        }
        assert_eq!(window.samples(), vec![45.0, 46.0, 47.0, 48.0, 49.0]);
    }

    #[test]
    fn test_meta_entropy_needs_two_samples() {
        let mut window = FusionWindow::new(4, 1.0).unwrap();
        assert_eq!(window.meta_entropy(), 0.0);
        window.update(0.8);
        assert_eq!(window.meta_entropy(), 0.0);
    }

    #[test]
    fn test_meta_entropy_of_equal_magnitudes() {
        let mut window = FusionWindow::new(4, 1.0).unwrap();
        window.update(1.0);
        window.update(-1.0);
        let expected = std::f64::consts::LN_2;
        assert!((window.meta_entropy() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_meta_entropy_all_zero_is_zero() {
        let mut window = FusionWindow::new(4, 1.0).unwrap();
        window.update(0.0);
        window.update(0.0);
        window.update(0.0);
        assert_eq!(window.meta_entropy(), 0.0);
    }

    #[test]
    fn test_fuse_pushes_only_first_signal() {
        let mut window = FusionWindow::new(4, 1.0).unwrap();
        window.fuse(0.3, 0.9);
        window.fuse(0.6, 0.1);
        assert_eq!(window.samples(), vec![0.3, 0.6]);
    }

    #[test]
    fn test_fuse_first_call_has_no_damping() {
        let mut window = FusionWindow::new(4, 2.0).unwrap();
        let fused = window.fuse(0.9, 0.4);
        assert!((fused - 0.5f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_fuse_is_bounded() {
        let mut window = FusionWindow::new(6, 3.0).unwrap();
        let inputs = [
            (0.0, 0.0),
            (1e6, -1e6),
            (-1e9, 1e9),
            (f64::MAX, -f64::MAX),
            (0.5, 0.25),
            (-3.0, 7.0),
            (1e-12, 1e-12),
        ];
        for (a, b) in inputs {
            let fused = window.fuse(a, b);
            assert!((-1.0..=1.0).contains(&fused), "fuse({}, {}) = {}", a, b, fused);
        }
    }

    #[test]
    fn test_volatile_history_pulls_toward_zero() {
        let mut calm = FusionWindow::new(10, 1.0).unwrap();
        let mut volatile = FusionWindow::new(10, 1.0).unwrap();
        calm.update(0.0);
        for v in [0.9, 0.1, 0.8, 0.2, 0.7] {
            volatile.update(v);
        }
        let calm_fused = calm.fuse(0.8, 0.1);
        let volatile_fused = volatile.fuse(0.8, 0.1);
        assert!(volatile_fused < calm_fused);
    }

    #[test]
    fn test_dynamic_threshold() {
        let mut window = FusionWindow::new(5, 1.0).unwrap();
        assert_eq!(window.dynamic_threshold(), DEFAULT_DYNAMIC_THRESHOLD);
        window.update(0.2);
        window.update(0.4);
        assert_eq!(window.dynamic_threshold(), DEFAULT_DYNAMIC_THRESHOLD);
        window.update(0.6);
        assert!((window.dynamic_threshold() - 0.4 * 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(FusionWindow::new(0, 1.0).is_err());
        assert!(FusionWindow::new(3, -0.1).is_err());
        assert!(FusionWindow::new(3, f64::NAN).is_err());
    }

    #[test]
    fn test_oversized_capacity_rejected_without_allocating() {
        let err = FusionWindow::new(usize::MAX, 1.0).unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)));
        assert!(FusionWindow::new(MAX_WINDOW_CAPACITY + 1, 1.0).is_err());

        let mut window = FusionWindow::new(MAX_WINDOW_CAPACITY, 1.0).unwrap();
        window.update(0.5);
        assert_eq!(window.samples(), vec![0.5]);
    }
}
