//! Fitted LaSVM model
//!
//! The decision function is `f(x) = Σ_k alpha_k K(x, sv_k) + b` over the
//! support vectors, with signed coefficients (`alpha_k` already carries the
//! label). A non-negative decision predicts the larger of the two classes.

use crate::core::{FeatureVector, Prediction, Result, SVMError, SVMModel};
use crate::kernel::{Kernel, KernelFunction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    kernel: KernelFunction,
    bias: f64,
    support_vectors: Vec<FeatureVector>,
    coefficients: Vec<f64>,
    /// `[negative, positive]` original class labels
    classes: [f64; 2],
    n_features: usize,
}

impl Model {
    pub fn new(
        kernel: KernelFunction,
        bias: f64,
        support_vectors: Vec<FeatureVector>,
        coefficients: Vec<f64>,
        classes: [f64; 2],
        n_features: usize,
    ) -> Result<Self> {
        if support_vectors.len() != coefficients.len() {
            return Err(SVMError::InvalidParameter(format!(
                "{} support vectors but {} coefficients",
                support_vectors.len(),
                coefficients.len()
            )));
        }
        if !(classes[0] < classes[1]) {
            return Err(SVMError::InvalidParameter(format!(
                "Classes must be two distinct ordered labels, got: {classes:?}"
            )));
        }
        Ok(Self {
            kernel,
            bias,
            support_vectors,
            coefficients,
            classes,
            n_features,
        })
    }

    /// Raw decision value for one example
    pub fn decision_value(&self, x: &FeatureVector) -> f64 {
        let mut sum = 0.0;
        for (sv, &alpha) in self.support_vectors.iter().zip(&self.coefficients) {
            sum += alpha * self.kernel.compute(x, sv);
        }
        sum + self.bias
    }

    /// Decision values for a batch
    pub fn decision_function(&self, xs: &[FeatureVector]) -> Vec<f64> {
        xs.iter().map(|x| self.decision_value(x)).collect()
    }

    /// Original class label for one example
    pub fn predict_label(&self, x: &FeatureVector) -> f64 {
        self.label_for(self.decision_value(x))
    }

    /// Map a decision value onto the original class labels
    pub fn label_for(&self, decision: f64) -> f64 {
        if decision >= 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }

    /// Reject dense inputs whose width differs from the training data
    pub fn check_dimensions(&self, xs: &[FeatureVector]) -> Result<()> {
        for x in xs {
            if let FeatureVector::Dense(values) = x {
                if values.len() != self.n_features {
                    return Err(SVMError::DimensionMismatch {
                        expected: self.n_features,
                        actual: values.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    pub fn support_vectors(&self) -> &[FeatureVector] {
        &self.support_vectors
    }

    /// Signed dual coefficients, one per support vector
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn classes(&self) -> [f64; 2] {
        self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl SVMModel for Model {
    fn predict(&self, x: &FeatureVector) -> Prediction {
        let decision_value = self.decision_value(x);
        Prediction::new(self.label_for(decision_value), decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.n_support()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
