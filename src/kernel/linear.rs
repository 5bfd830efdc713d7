//! Linear kernel implementation

use crate::core::FeatureVector;
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Linear kernel: K(x, y) = x^T * y
///
/// For sparse vectors the dot product only visits stored entries, merging the
/// two sorted index lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        x.dot(y)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    #[test]
    fn test_linear_kernel_basic() {
        let kernel = LinearKernel::new();

        let x = SparseVector::new(vec![0, 2, 4], vec![1.0, 2.0, 3.0]).into();
        let y = SparseVector::new(vec![1, 2, 3], vec![1.0, 2.0, 3.0]).into();

        // Only index 2 overlaps: 2.0 * 2.0 = 4.0
        assert_eq!(kernel.compute(&x, &y), 4.0);
    }

    #[test]
    fn test_linear_kernel_identical() {
        let kernel = LinearKernel::new();
        let x = FeatureVector::Dense(vec![1.0, 2.0, 3.0]);

        assert_eq!(kernel.compute(&x, &x), 14.0);
    }

    #[test]
    fn test_linear_kernel_no_overlap() {
        let kernel = LinearKernel::new();

        let x = SparseVector::new(vec![0, 2], vec![1.0, 2.0]).into();
        let y = SparseVector::new(vec![1, 3], vec![1.0, 2.0]).into();

        assert_eq!(kernel.compute(&x, &y), 0.0);
    }

    #[test]
    fn test_linear_kernel_empty() {
        let kernel = LinearKernel::new();
        let x = SparseVector::new(Vec::new(), Vec::new()).into();
        let y = FeatureVector::Dense(vec![1.0, 2.0]);

        assert_eq!(kernel.compute(&x, &y), 0.0);
        assert_eq!(kernel.compute(&y, &x), 0.0);
    }
}
