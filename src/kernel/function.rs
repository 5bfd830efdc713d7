//! Resolved kernel selection
//!
//! [`KernelFunction`] is the concrete kernel a session trains with and a model
//! predicts with. It is resolved once from the configuration at fit entry so
//! that `gamma = None` becomes `1 / n_features` and every parameter error is
//! reported before optimization starts.

use crate::core::{FeatureVector, KernelType, LaSvmConfig, Result, SVMError};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelFunction {
    Linear(LinearKernel),
    Rbf(RBFKernel),
    Poly(PolynomialKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelFunction {
    /// Resolve the kernel described by `config` for data with `n_features` columns
    pub fn resolve(config: &LaSvmConfig, n_features: usize) -> Result<Self> {
        let gamma = match (config.kernel, config.gamma) {
            (KernelType::Linear, _) => 1.0,
            (_, Some(gamma)) if gamma.is_finite() && gamma > 0.0 => gamma,
            (_, Some(gamma)) => {
                return Err(SVMError::InvalidParameter(format!(
                    "Gamma must be positive, got: {gamma}"
                )))
            }
            (_, None) if n_features > 0 => 1.0 / n_features as f64,
            (kernel, None) => {
                return Err(SVMError::InvalidParameter(format!(
                    "Cannot derive gamma for the {kernel} kernel from zero features"
                )))
            }
        };

        let function = match config.kernel {
            KernelType::Linear => KernelFunction::Linear(LinearKernel::new()),
            KernelType::Rbf => KernelFunction::Rbf(RBFKernel::new(gamma)),
            KernelType::Poly => {
                if config.degree == 0 {
                    return Err(SVMError::InvalidParameter(
                        "Polynomial degree must be positive".to_string(),
                    ));
                }
                KernelFunction::Poly(PolynomialKernel::new(config.degree, gamma, config.coef0))
            }
            KernelType::Sigmoid => KernelFunction::Sigmoid(SigmoidKernel::new(gamma, config.coef0)),
        };
        Ok(function)
    }

    pub fn kernel_type(&self) -> KernelType {
        match self {
            KernelFunction::Linear(_) => KernelType::Linear,
            KernelFunction::Rbf(_) => KernelType::Rbf,
            KernelFunction::Poly(_) => KernelType::Poly,
            KernelFunction::Sigmoid(_) => KernelType::Sigmoid,
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        match self {
            KernelFunction::Linear(k) => k.compute(x, y),
            KernelFunction::Rbf(k) => k.compute(x, y),
            KernelFunction::Poly(k) => k.compute(x, y),
            KernelFunction::Sigmoid(k) => k.compute(x, y),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            KernelFunction::Linear(k) => k.name(),
            KernelFunction::Rbf(k) => k.name(),
            KernelFunction::Poly(k) => k.name(),
            KernelFunction::Sigmoid(k) => k.name(),
        }
    }
}
