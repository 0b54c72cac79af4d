//! Patch shape and evaluation settings shared by patch edges.

use photoba_io::PATCH_DIM;

/// Residual value written to every component when a patch leaves the image.
pub const DEFAULT_PENALTY: f64 = 255.0;

/// Baselines with a smaller magnitude select the same-side comparison.
pub const DEFAULT_BASELINE_EPSILON: f64 = 1e-7;

/// Ordered pixel offsets sampled around a point, in working-level pixels.
///
/// The pattern length fixes the residual dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighbourhoodPattern {
    offsets: [(f64, f64); PATCH_DIM],
}

impl NeighbourhoodPattern {
    pub fn new(offsets: [(f64, f64); PATCH_DIM]) -> Self {
        Self { offsets }
    }

    /// Square 3×3 grid with the given spacing, row by row.
    pub fn grid(step: f64) -> Self {
        let mut offsets = [(0.0, 0.0); PATCH_DIM];
        for (k, offset) in offsets.iter_mut().enumerate() {
            let dx = (k % 3) as f64 - 1.0;
            let dy = (k / 3) as f64 - 1.0;
            *offset = (dx * step, dy * step);
        }
        Self { offsets }
    }

    pub fn offsets(&self) -> &[(f64, f64); PATCH_DIM] {
        &self.offsets
    }
}

impl Default for NeighbourhoodPattern {
    fn default() -> Self {
        Self::grid(1.0)
    }
}

/// Configuration of a [`PatchEdge`](super::PatchEdge).
///
/// # Example
///
/// ```
/// use photoba::factors::{NeighbourhoodPattern, PatchEdgeConfig};
///
/// let config = PatchEdgeConfig::default()
///     .with_pattern(NeighbourhoodPattern::grid(2.0))
///     .with_verbose_bailout();
/// assert_eq!(config.penalty, 255.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchEdgeConfig {
    /// Uniform residual of a patch with an out-of-range sample
    pub penalty: f64,
    /// Numeric zero for the stereo baseline
    pub baseline_epsilon: f64,
    pub pattern: NeighbourhoodPattern,
    /// Log a debug event whenever a patch bails out
    pub verbose_bailout: bool,
}

impl Default for PatchEdgeConfig {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
            baseline_epsilon: DEFAULT_BASELINE_EPSILON,
            pattern: NeighbourhoodPattern::default(),
            verbose_bailout: false,
        }
    }
}

impl PatchEdgeConfig {
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_baseline_epsilon(mut self, baseline_epsilon: f64) -> Self {
        self.baseline_epsilon = baseline_epsilon;
        self
    }

    pub fn with_pattern(mut self, pattern: NeighbourhoodPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_verbose_bailout(mut self) -> Self {
        self.verbose_bailout = true;
        self
    }
}
