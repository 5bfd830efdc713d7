//! Kernel matrix access by example slot
//!
//! Owns the example arena, the resolved kernel, the kernel diagonal and the
//! row cache. Everything in the solver asks for `K(i, j)` through
//! [`KernelMatrix::eval`] so that caching stays an implementation detail.

use crate::cache::{CacheStats, KernelCache};
use crate::core::FeatureVector;
use crate::kernel::{Kernel, KernelFunction};

pub struct KernelMatrix {
    kernel: KernelFunction,
    examples: Vec<FeatureVector>,
    diag: Vec<f64>,
    cache: KernelCache,
    evaluations: u64,
}

impl KernelMatrix {
    /// Build the matrix over `examples`, caching rows within `cache_size` bytes
    pub fn new(kernel: KernelFunction, examples: Vec<FeatureVector>, cache_size: usize) -> Self {
        let diag = examples.iter().map(|x| kernel.compute(x, x)).collect();
        let cache = KernelCache::new(cache_size, examples.len());
        Self {
            kernel,
            evaluations: examples.len() as u64,
            examples,
            diag,
            cache,
        }
    }

    /// Number of example slots
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    pub fn example(&self, i: usize) -> &FeatureVector {
        &self.examples[i]
    }

    pub fn examples(&self) -> &[FeatureVector] {
        &self.examples
    }

    /// K(i, i)
    pub fn diag(&self, i: usize) -> f64 {
        self.diag[i]
    }

    /// K(i, j), served from the cache when possible
    pub fn eval(&mut self, i: usize, j: usize) -> f64 {
        if i == j {
            return self.diag[i];
        }
        let kernel = &self.kernel;
        let examples = &self.examples;
        let evaluations = &mut self.evaluations;
        self.cache.get_or_compute(i, j, || {
            *evaluations += 1;
            kernel.compute(&examples[i], &examples[j])
        })
    }

    /// Append new example slots; existing slots and cached rows stay valid
    pub fn extend(&mut self, examples: Vec<FeatureVector>) {
        for x in &examples {
            self.diag.push(self.kernel.compute(x, x));
        }
        self.evaluations += examples.len() as u64;
        self.examples.extend(examples);
        self.cache.extend_rows(self.examples.len());
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of actual kernel function evaluations so far
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::RBFKernel;

    fn points() -> Vec<FeatureVector> {
        vec![
            FeatureVector::Dense(vec![0.0, 0.0]),
            FeatureVector::Dense(vec![1.0, 0.0]),
            FeatureVector::Dense(vec![0.0, 2.0]),
        ]
    }

    #[test]
    fn test_eval_uses_cache() {
        let mut matrix = KernelMatrix::new(KernelFunction::Rbf(RBFKernel::new(1.0)), points(), 1 << 20);
        assert_eq!(matrix.evaluations(), 3);

        let first = matrix.eval(0, 1);
        let again = matrix.eval(1, 0);
        assert_eq!(first, again);
        assert_eq!(matrix.evaluations(), 4);
        assert_eq!(matrix.diag(2), 1.0);
        assert_eq!(matrix.eval(2, 2), 1.0);
    }

    #[test]
    fn test_disabled_cache_recomputes_identically() {
        let kernel = KernelFunction::Rbf(RBFKernel::new(0.5));
        let mut cached = KernelMatrix::new(kernel.clone(), points(), 1 << 20);
        let mut uncached = KernelMatrix::new(kernel, points(), 0);

        for _ in 0..2 {
            for i in 0..3 {
                for j in 0..3 {
                    assert_eq!(cached.eval(i, j), uncached.eval(i, j));
                }
            }
        }
        assert!(uncached.evaluations() > cached.evaluations());
    }

    #[test]
    fn test_extend_appends_slots() {
        let mut matrix = KernelMatrix::new(KernelFunction::Rbf(RBFKernel::new(1.0)), points(), 1 << 20);
        let before = matrix.eval(0, 2);

        matrix.extend(vec![FeatureVector::Dense(vec![3.0, 3.0])]);
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix.eval(0, 2), before);
        assert_eq!(matrix.eval(3, 0), (-18.0_f64).exp());
    }
}
