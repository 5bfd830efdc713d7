//! Kernel trait definition

use crate::core::FeatureVector;

/// Kernel function trait
///
/// A kernel function K(x, y) must be symmetric and deterministic: the solver
/// caches K(i, j) under either ordering of the pair, so `compute(x, y)` and
/// `compute(y, x)` have to agree bit for bit.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64;

    /// Short name used in logs and model files
    fn name(&self) -> &'static str;
}
