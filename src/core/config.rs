//! Solver configuration
//!
//! [`LaSvmConfig`] gathers every tunable of the estimator. It is validated
//! eagerly when a fit starts; nothing in here is consulted for validity once
//! optimization is underway.

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl FromStr for KernelType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelType::Linear),
            "rbf" => Ok(KernelType::Rbf),
            "poly" | "polynomial" => Ok(KernelType::Poly),
            "sigmoid" => Ok(KernelType::Sigmoid),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown kernel: {other}. Use linear, rbf, poly or sigmoid"
            ))),
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelType::Linear => "linear",
            KernelType::Rbf => "rbf",
            KernelType::Poly => "poly",
            KernelType::Sigmoid => "sigmoid",
        };
        f.write_str(name)
    }
}

/// Policy used to pick the next example to PROCESS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Round-robin over example slots
    Cyclic,
    /// Most KKT-violating example from a random pool
    Active,
    /// Largest margin loss from a random pool
    Loss,
}

impl FromStr for Selection {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cyclic" => Ok(Selection::Cyclic),
            "active" => Ok(Selection::Active),
            "loss" => Ok(Selection::Loss),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown selection: {other}. Use cyclic, active or loss"
            ))),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Selection::Cyclic => "cyclic",
            Selection::Active => "active",
            Selection::Loss => "loss",
        };
        f.write_str(name)
    }
}

/// Which stopping rule ends the PROCESS/REPROCESS loop (the pass cap always applies)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Stop once the KKT gap over the whole training set is below `tau`
    Gap,
    /// Stop once the number of non-zero coefficients reaches `n_components`
    NComponents,
    /// Run every pass allowed by `max_iter`
    MaxIter,
}

impl FromStr for Termination {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gap" | "convergence" => Ok(Termination::Gap),
            "n_components" | "n-components" => Ok(Termination::NComponents),
            "max_iter" | "max-iter" => Ok(Termination::MaxIter),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown termination: {other}. Use gap, n_components or max_iter"
            ))),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Termination::Gap => "gap",
            Termination::NComponents => "n_components",
            Termination::MaxIter => "max_iter",
        };
        f.write_str(name)
    }
}

/// Margin loss used to rank candidates under [`Selection::Loss`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    #[default]
    Hinge,
    SquaredHinge,
    Logistic,
}

impl LossKind {
    /// Loss of an example with functional margin `margin = y * f(x)`
    pub fn loss(&self, margin: f64) -> f64 {
        match self {
            LossKind::Hinge => (1.0 - margin).max(0.0),
            LossKind::SquaredHinge => {
                let h = (1.0 - margin).max(0.0);
                h * h
            }
            LossKind::Logistic => {
                // log(1 + e^-m) without overflow for large negative margins
                if margin < 0.0 {
                    -margin + margin.exp().ln_1p()
                } else {
                    (-margin).exp().ln_1p()
                }
            }
        }
    }
}

impl FromStr for LossKind {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hinge" => Ok(LossKind::Hinge),
            "squared_hinge" | "squared-hinge" => Ok(LossKind::SquaredHinge),
            "logistic" | "log" => Ok(LossKind::Logistic),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown loss: {other}. Use hinge, squared_hinge or logistic"
            ))),
        }
    }
}

/// Configuration for the LaSVM estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaSvmConfig {
    pub kernel: KernelType,
    /// Box constraint: `0 <= y_i * alpha_i <= C * w_i`
    pub c: f64,
    /// Kernel width/scale; `None` resolves to `1 / n_features`
    pub gamma: Option<f64>,
    /// Polynomial degree
    pub degree: u32,
    /// Independent term of the polynomial and sigmoid kernels
    pub coef0: f64,
    /// Tolerance on the KKT gap (`tau` in the LaSVM paper)
    pub tau: f64,
    /// Maximum number of passes over the training data
    pub max_iter: usize,
    pub selection: Selection,
    pub loss: LossKind,
    /// Pool size for the `active` and `loss` selection policies
    pub search_size: usize,
    pub termination: Termination,
    /// Target number of non-zero coefficients for [`Termination::NComponents`]
    pub n_components: Option<usize>,
    /// Run REPROCESS to convergence after the online passes
    pub finish_step: bool,
    /// Reuse the previous session when `fit` is called again
    pub warm_start: bool,
    /// Kernel cache size in bytes (0 disables caching)
    pub cache_size: usize,
    /// Seed for candidate sampling
    pub random_state: u64,
    /// Pairwise updates performed by each REPROCESS phase
    pub reprocess_budget: usize,
    /// Wall-clock budget, checked between updates
    pub time_limit: Option<Duration>,
}

impl Default for LaSvmConfig {
    fn default() -> Self {
        Self {
            kernel: KernelType::Rbf,
            c: 1.0,
            gamma: None,
            degree: 3,
            coef0: 0.0,
            tau: 1e-3,
            max_iter: 10,
            selection: Selection::Cyclic,
            loss: LossKind::Hinge,
            search_size: 60,
            termination: Termination::Gap,
            n_components: None,
            finish_step: true,
            warm_start: false,
            cache_size: 100_000_000, // 100MB
            random_state: 0,
            reprocess_budget: 1,
            time_limit: None,
        }
    }
}

impl LaSvmConfig {
    /// Check every parameter, returning the first configuration error found
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive and finite, got: {}",
                self.c
            )));
        }
        if let Some(gamma) = self.gamma {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(SVMError::InvalidParameter(format!(
                    "Gamma must be positive, got: {gamma}"
                )));
            }
        }
        if self.kernel == KernelType::Poly && self.degree == 0 {
            return Err(SVMError::InvalidParameter(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        if !self.coef0.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "coef0 must be finite, got: {}",
                self.coef0
            )));
        }
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Tolerance tau must be positive, got: {}",
                self.tau
            )));
        }
        if self.max_iter == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if self.search_size == 0 {
            return Err(SVMError::InvalidParameter(
                "search_size must be at least 1".to_string(),
            ));
        }
        if self.reprocess_budget == 0 {
            return Err(SVMError::InvalidParameter(
                "reprocess_budget must be at least 1".to_string(),
            ));
        }
        match (self.termination, self.n_components) {
            (Termination::NComponents, None) => {
                return Err(SVMError::InvalidParameter(
                    "termination n_components requires n_components to be set".to_string(),
                ));
            }
            // A single non-zero coefficient cannot satisfy sum(alpha) == 0
            (Termination::NComponents, Some(k)) if k < 2 => {
                return Err(SVMError::InvalidParameter(format!(
                    "n_components must be at least 2, got: {k}"
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// The solver-relevant subset of this configuration
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            c: self.c,
            tau: self.tau,
            max_iter: self.max_iter,
            selection: self.selection,
            loss: self.loss,
            search_size: self.search_size,
            termination: self.termination,
            n_components: self.n_components,
            finish_step: self.finish_step,
            cache_size: self.cache_size,
            random_state: self.random_state,
            reprocess_budget: self.reprocess_budget,
            time_limit: self.time_limit,
        }
    }
}

/// Parameters consumed by a solver [`Session`](crate::solver::Session)
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub c: f64,
    pub tau: f64,
    pub max_iter: usize,
    pub selection: Selection,
    pub loss: LossKind,
    pub search_size: usize,
    pub termination: Termination,
    pub n_components: Option<usize>,
    pub finish_step: bool,
    pub cache_size: usize,
    pub random_state: u64,
    pub reprocess_budget: usize,
    pub time_limit: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        LaSvmConfig::default().solver_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_config_default() {
        let config = LaSvmConfig::default();
        assert_eq!(config.kernel, KernelType::Rbf);
        assert_eq!(config.c, 1.0);
        assert_eq!(config.tau, 1e-3);
        assert_eq!(config.selection, Selection::Cyclic);
        assert_eq!(config.termination, Termination::Gap);
        assert!(config.finish_step);
        assert!(!config.warm_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("RBF".parse::<KernelType>().unwrap(), KernelType::Rbf);
        assert_eq!("polynomial".parse::<KernelType>().unwrap(), KernelType::Poly);
        assert_eq!("loss".parse::<Selection>().unwrap(), Selection::Loss);
        assert_eq!(
            "n_components".parse::<Termination>().unwrap(),
            Termination::NComponents
        );
        assert!("quadratic".parse::<KernelType>().is_err());
        assert!("greedy".parse::<Selection>().is_err());

        for kernel in [
            KernelType::Linear,
            KernelType::Rbf,
            KernelType::Poly,
            KernelType::Sigmoid,
        ] {
            assert_eq!(kernel.to_string().parse::<KernelType>().unwrap(), kernel);
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            LaSvmConfig {
                c: 0.0,
                ..Default::default()
            },
            LaSvmConfig {
                gamma: Some(-1.0),
                ..Default::default()
            },
            LaSvmConfig {
                kernel: KernelType::Poly,
                degree: 0,
                ..Default::default()
            },
            LaSvmConfig {
                tau: 0.0,
                ..Default::default()
            },
            LaSvmConfig {
                max_iter: 0,
                ..Default::default()
            },
            LaSvmConfig {
                termination: Termination::NComponents,
                ..Default::default()
            },
            LaSvmConfig {
                termination: Termination::NComponents,
                n_components: Some(1),
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(SVMError::InvalidParameter(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_losses() {
        assert_eq!(LossKind::Hinge.loss(2.0), 0.0);
        assert_eq!(LossKind::Hinge.loss(-1.0), 2.0);
        assert_eq!(LossKind::SquaredHinge.loss(-1.0), 4.0);
        assert_relative_eq!(LossKind::Logistic.loss(0.0), 2.0_f64.ln());
        assert!(LossKind::Logistic.loss(-800.0).is_finite());
        assert!(LossKind::Logistic.loss(-1.0) > LossKind::Logistic.loss(1.0));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = LaSvmConfig {
            kernel: KernelType::Poly,
            selection: Selection::Active,
            termination: Termination::NComponents,
            n_components: Some(12),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"n_components\""));
        let back: LaSvmConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
