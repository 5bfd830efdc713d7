//! High-level estimator interface
//!
//! [`LaSVM`] is a binary classifier trained with the online LaSVM solver.
//! Labels can be any two distinct values; the smaller one becomes the
//! negative class and the larger one the positive class.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lasvm::{FeatureVector, LaSVM};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let x: Vec<FeatureVector> = vec![
//!     vec![2.0, 1.0].into(),
//!     vec![-2.0, -1.0].into(),
//!     vec![1.5, 2.0].into(),
//!     vec![-1.5, -2.0].into(),
//! ];
//! let y = vec![1.0, 0.0, 1.0, 0.0];
//!
//! let mut svm = LaSVM::new().with_c(1.0).with_gamma(0.5);
//! svm.fit(&x, &y)?;
//!
//! let labels = svm.predict(&x)?;
//! println!("Accuracy: {:.2}%", svm.score(&x, &y)? * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Incremental training
//!
//! With `warm_start`, calling [`LaSVM::fit`] again on data that starts with
//! the previously fitted examples only processes the new ones.
//! [`LaSVM::partial_fit`] always continues the existing session with just
//! the new batch.

use crate::core::{
    Dataset, FeatureVector, KernelType, LaSvmConfig, LossKind, Result, SVMError, Selection,
    Termination,
};
use crate::kernel::KernelFunction;
use crate::model::Model;
use crate::solver::{FitReport, Session};
use log::info;
use std::time::Duration;

/// LaSVM binary classifier with builder-style configuration
#[derive(Default)]
pub struct LaSVM {
    config: LaSvmConfig,
    session: Option<Session>,
    model: Option<Model>,
    classes: Option<[f64; 2]>,
    n_features: usize,
}

impl LaSVM {
    /// Create an estimator with default parameters (RBF kernel, C = 1)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator from a full configuration
    pub fn with_config(config: LaSvmConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Set the kernel family
    pub fn with_kernel(mut self, kernel: KernelType) -> Self {
        self.config.kernel = kernel;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set the kernel width; unset means `1 / n_features`
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.config.gamma = Some(gamma);
        self
    }

    pub fn with_degree(mut self, degree: u32) -> Self {
        self.config.degree = degree;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.config.coef0 = coef0;
        self
    }

    /// Set the KKT gap tolerance
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.config.tau = tau;
        self
    }

    /// Set the maximum number of passes over the data
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.config.loss = loss;
        self
    }

    pub fn with_search_size(mut self, search_size: usize) -> Self {
        self.config.search_size = search_size;
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.config.termination = termination;
        self
    }

    /// Target number of support vectors; also switches termination to
    /// [`Termination::NComponents`]
    pub fn with_n_components(mut self, n_components: usize) -> Self {
        self.config.n_components = Some(n_components);
        self.config.termination = Termination::NComponents;
        self
    }

    pub fn with_finish_step(mut self, finish_step: bool) -> Self {
        self.config.finish_step = finish_step;
        self
    }

    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.config.warm_start = warm_start;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.config.random_state = random_state;
        self
    }

    pub fn with_reprocess_budget(mut self, reprocess_budget: usize) -> Self {
        self.config.reprocess_budget = reprocess_budget;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.config.time_limit = Some(time_limit);
        self
    }

    /// Replace the configuration of an existing estimator. The next `fit`
    /// decides whether the live session can be kept.
    pub fn set_config(&mut self, config: LaSvmConfig) {
        self.config = config;
    }

    /// Fit with unit sample weights
    pub fn fit(&mut self, x: &[FeatureVector], y: &[f64]) -> Result<FitReport> {
        let weights = vec![1.0; y.len()];
        self.fit_weighted(x, y, &weights)
    }

    /// Fit with per-sample weights scaling the box constraint
    pub fn fit_weighted(
        &mut self,
        x: &[FeatureVector],
        y: &[f64],
        sample_weight: &[f64],
    ) -> Result<FitReport> {
        self.config.validate()?;
        let n_features = check_inputs(x, y, sample_weight)?;
        let classes = binary_classes(y)?;
        let labels = encode(y, classes)?;

        if self.config.warm_start {
            match self.resumable(x, &labels, sample_weight, classes, n_features) {
                Ok(()) => return self.resume(x, labels, sample_weight),
                Err(why) if self.session.is_some() => {
                    info!("Warm start not possible ({why}), restarting from scratch");
                }
                Err(_) => {}
            }
        }

        let kernel = KernelFunction::resolve(&self.config, n_features)?;
        self.classes = Some(classes);
        self.n_features = n_features;
        self.model = None;
        self.session = Some(Session::new(
            kernel,
            self.config.solver_config(),
            x.to_vec(),
            labels,
            sample_weight.to_vec(),
        )?);
        self.train()
    }

    /// Fit on every sample of a dataset
    pub fn fit_dataset<D: Dataset>(&mut self, dataset: &D) -> Result<FitReport> {
        let (x, y) = dataset.to_parts();
        self.fit(&x, &y)
    }

    /// Continue training with a new batch. Without a previous fit this is
    /// a plain `fit`.
    pub fn partial_fit(&mut self, x: &[FeatureVector], y: &[f64]) -> Result<FitReport> {
        let Some(classes) = self.classes.filter(|_| self.session.is_some()) else {
            return self.fit(x, y);
        };
        self.config.validate()?;
        let weights = vec![1.0; y.len()];
        let n_features = check_inputs(x, y, &weights)?;
        if n_features > self.n_features {
            return Err(SVMError::DimensionMismatch {
                expected: self.n_features,
                actual: n_features,
            });
        }
        let labels = encode(y, classes)?;

        let config = self.config.solver_config();
        let session = self.session_mut()?;
        session.reconfigure(config)?;
        session.extend(x.to_vec(), labels, weights)?;
        self.train()
    }

    /// Why the live session cannot be continued with this data and config
    fn resumable(
        &self,
        x: &[FeatureVector],
        labels: &[f64],
        weights: &[f64],
        classes: [f64; 2],
        n_features: usize,
    ) -> std::result::Result<(), String> {
        let Some(session) = self.session.as_ref() else {
            return Err("no previous session".to_string());
        };
        if self.classes != Some(classes) {
            return Err("classes changed".to_string());
        }
        if n_features != self.n_features {
            return Err(format!("feature count changed from {} to {n_features}", self.n_features));
        }
        let kernel = KernelFunction::resolve(&self.config, n_features).map_err(|e| e.to_string())?;
        if &kernel != session.kernel() {
            return Err("kernel changed".to_string());
        }
        if self.config.c < session.config().c {
            return Err("C decreased".to_string());
        }
        let n_old = session.len();
        if x.len() < n_old {
            return Err("fewer examples than the previous fit".to_string());
        }
        let state = session.state();
        let same_prefix = session.examples() == &x[..n_old]
            && state.labels() == &labels[..n_old]
            && (0..n_old).all(|s| state.weight(s) == weights[s]);
        if !same_prefix {
            return Err("previous examples were changed".to_string());
        }
        Ok(())
    }

    fn resume(&mut self, x: &[FeatureVector], labels: Vec<f64>, weights: &[f64]) -> Result<FitReport> {
        let config = self.config.solver_config();
        let session = self.session_mut()?;
        let n_old = session.len();
        info!("Warm start: keeping {} examples, adding {}", n_old, x.len() - n_old);
        session.reconfigure(config)?;
        session.extend(x[n_old..].to_vec(), labels[n_old..].to_vec(), weights[n_old..].to_vec())?;
        self.train()
    }

    fn train(&mut self) -> Result<FitReport> {
        let classes = self.classes.ok_or(SVMError::ModelNotTrained)?;
        let n_features = self.n_features;
        let session = self.session_mut()?;
        let report = session.run();
        let model = session.model(classes, n_features)?;
        self.model = Some(model);
        Ok(report)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(SVMError::ModelNotTrained)
    }

    fn fitted(&self) -> Result<&Model> {
        self.model.as_ref().ok_or(SVMError::ModelNotTrained)
    }

    /// Raw decision values `f(x)`
    pub fn decision_function(&self, x: &[FeatureVector]) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        model.check_dimensions(x)?;
        Ok(model.decision_function(x))
    }

    /// Predicted labels, in terms of the classes seen during fit
    pub fn predict(&self, x: &[FeatureVector]) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| model.label_for(d))
            .collect())
    }

    /// Mean accuracy on `(x, y)`
    pub fn score(&self, x: &[FeatureVector], y: &[f64]) -> Result<f64> {
        Ok(self.evaluate_detailed(x, y)?.accuracy())
    }

    /// Confusion counts with the larger class as the positive class
    pub fn evaluate_detailed(&self, x: &[FeatureVector], y: &[f64]) -> Result<EvaluationMetrics> {
        if x.len() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let positive = self.fitted()?.classes()[1];
        let predictions = self.predict(x)?;
        Ok(EvaluationMetrics::from_labels(&predictions, y, positive))
    }

    /// Number of support vectors of the fitted model
    pub fn n_support(&self) -> usize {
        self.model.as_ref().map_or(0, Model::n_support)
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Take the fitted model out of the estimator
    pub fn into_model(self) -> Option<Model> {
        self.model
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &LaSvmConfig {
        &self.config
    }

    /// Classes seen by the first fit, as `[negative, positive]`
    pub fn classes(&self) -> Option<[f64; 2]> {
        self.classes
    }
}

/// Validate shapes and weights; returns the feature count
fn check_inputs(x: &[FeatureVector], y: &[f64], sample_weight: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    if y.len() != x.len() {
        return Err(SVMError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    if sample_weight.len() != x.len() {
        return Err(SVMError::DimensionMismatch {
            expected: x.len(),
            actual: sample_weight.len(),
        });
    }
    if let Some(&w) = sample_weight.iter().find(|&&w| !(w.is_finite() && w > 0.0)) {
        return Err(SVMError::InvalidParameter(format!(
            "Sample weights must be positive and finite, got: {w}"
        )));
    }

    let mut dense_width = None;
    let mut n_features = 0;
    for row in x {
        if let FeatureVector::Dense(values) = row {
            match dense_width {
                None => dense_width = Some(values.len()),
                Some(width) if width != values.len() => {
                    return Err(SVMError::DimensionMismatch {
                        expected: width,
                        actual: values.len(),
                    });
                }
                Some(_) => {}
            }
        }
        n_features = n_features.max(row.dim());
    }
    Ok(n_features)
}

/// Sorted pair of distinct labels in `y`
fn binary_classes(y: &[f64]) -> Result<[f64; 2]> {
    if let Some(&bad) = y.iter().find(|v| !v.is_finite()) {
        return Err(SVMError::InvalidLabel(bad));
    }
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    match classes.as_slice() {
        [negative, positive] => Ok([*negative, *positive]),
        [_] => Err(SVMError::InvalidDataset(
            "Training data must contain two classes, found one".to_string(),
        )),
        many => Err(SVMError::TooManyClasses { found: many.len() }),
    }
}

/// Map labels onto {-1, +1}
fn encode(y: &[f64], classes: [f64; 2]) -> Result<Vec<f64>> {
    y.iter()
        .map(|&v| {
            if v == classes[1] {
                Ok(1.0)
            } else if v == classes[0] {
                Ok(-1.0)
            } else {
                Err(SVMError::InvalidLabel(v))
            }
        })
        .collect()
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Count outcomes of `predicted` against `actual`, where `positive` is
    /// the label of the positive class
    pub fn from_labels(predicted: &[f64], actual: &[f64], positive: f64) -> Self {
        let mut tp = 0; // True positives
        let mut tn = 0; // True negatives
        let mut fp = 0; // False positives
        let mut fn_ = 0; // False negatives

        for (&pred, &truth) in predicted.iter().zip(actual) {
            match (pred == positive, truth == positive) {
                (true, true) => tp += 1,
                (false, false) => tn += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
            }
        }

        Self::new(tp, tn, fp, fn_)
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        let total =
            self.true_positives + self.true_negatives + self.false_positives + self.false_negatives;
        if total == 0 {
            0.0
        } else {
            (self.true_positives + self.true_negatives) as f64 / total as f64
        }
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denominator = self.true_positives + self.false_positives;
        if denominator == 0 {
            0.0
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denominator = self.true_positives + self.false_negatives;
        if denominator == 0 {
            0.0
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        let denominator = self.true_negatives + self.false_positives;
        if denominator == 0 {
            0.0
        } else {
            self.true_negatives as f64 / denominator as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    fn toy() -> (Vec<FeatureVector>, Vec<f64>) {
        let x = vec![
            vec![2.0, 1.0].into(),
            vec![-2.0, -1.0].into(),
            vec![1.5, 2.0].into(),
            vec![-1.5, -2.0].into(),
            vec![2.5, 0.5].into(),
            vec![-2.5, -0.5].into(),
        ];
        (x, vec![5.0, 3.0, 5.0, 3.0, 5.0, 3.0])
    }

    #[test]
    fn test_builder_pattern() {
        let svm = LaSVM::new()
            .with_kernel(KernelType::Linear)
            .with_c(2.0)
            .with_tau(0.01)
            .with_max_iter(50)
            .with_selection(Selection::Active)
            .with_n_components(8)
            .with_time_limit(Duration::from_secs(5));

        let config = svm.config();
        assert_eq!(config.kernel, KernelType::Linear);
        assert_eq!(config.c, 2.0);
        assert_eq!(config.tau, 0.01);
        assert_eq!(config.max_iter, 50);
        assert_eq!(config.selection, Selection::Active);
        assert_eq!(config.termination, Termination::NComponents);
        assert_eq!(config.n_components, Some(8));
        assert_eq!(config.time_limit, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_fit_predict_original_labels() {
        let (x, y) = toy();
        let mut svm = LaSVM::new().with_kernel(KernelType::Linear);
        let report = svm.fit(&x, &y).expect("Training should succeed");

        assert!(report.n_support > 0);
        assert_eq!(svm.classes(), Some([3.0, 5.0]));
        assert_eq!(svm.predict(&x).unwrap(), y);
        assert_eq!(svm.score(&x, &y).unwrap(), 1.0);

        let decisions = svm.decision_function(&x).unwrap();
        assert!(decisions[0] > 0.0 && decisions[1] < 0.0);
    }

    #[test]
    fn test_sparse_input() {
        let x: Vec<FeatureVector> = vec![
            SparseVector::new(vec![0], vec![2.0]).into(),
            SparseVector::new(vec![0], vec![-2.0]).into(),
            SparseVector::new(vec![0, 3], vec![1.5, 0.1]).into(),
            SparseVector::new(vec![0], vec![-1.5]).into(),
        ];
        let y = vec![1.0, -1.0, 1.0, -1.0];
        let mut svm = LaSVM::new().with_kernel(KernelType::Linear);
        svm.fit(&x, &y).unwrap();

        let test: Vec<FeatureVector> = vec![SparseVector::new(vec![0], vec![1.0]).into()];
        assert_eq!(svm.predict(&test).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_input_errors() {
        let (x, y) = toy();
        let mut svm = LaSVM::new();

        assert!(matches!(svm.fit(&[], &[]), Err(SVMError::EmptyDataset)));
        assert!(matches!(
            svm.fit(&x, &y[..3]),
            Err(SVMError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            svm.fit(&x, &[1.0; 6]),
            Err(SVMError::InvalidDataset(_))
        ));
        assert!(matches!(
            svm.fit(&x, &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]),
            Err(SVMError::TooManyClasses { found: 3 })
        ));

        let ragged: Vec<FeatureVector> = vec![vec![1.0, 2.0].into(), vec![1.0].into()];
        assert!(matches!(
            svm.fit(&ragged, &[1.0, -1.0]),
            Err(SVMError::DimensionMismatch { expected: 2, actual: 1 })
        ));

        assert!(matches!(
            svm.fit_weighted(&x, &y, &[1.0, 1.0, 0.0, 1.0, 1.0, 1.0]),
            Err(SVMError::InvalidParameter(_))
        ));

        assert!(matches!(svm.predict(&x), Err(SVMError::ModelNotTrained)));
        assert_eq!(svm.n_support(), 0);
    }

    #[test]
    fn test_invalid_config_rejected_at_fit() {
        let (x, y) = toy();
        let mut svm = LaSVM::new().with_c(-1.0);
        assert!(matches!(svm.fit(&x, &y), Err(SVMError::InvalidParameter(_))));

        let mut svm = LaSVM::new().with_n_components(1);
        assert!(matches!(svm.fit(&x, &y), Err(SVMError::InvalidParameter(_))));
    }

    #[test]
    fn test_predict_checks_width() {
        let (x, y) = toy();
        let mut svm = LaSVM::new();
        svm.fit(&x, &y).unwrap();

        let narrow: Vec<FeatureVector> = vec![vec![1.0].into()];
        assert!(matches!(
            svm.predict(&narrow),
            Err(SVMError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_partial_fit_rejects_unknown_label() {
        let (x, y) = toy();
        let mut svm = LaSVM::new().with_kernel(KernelType::Linear);
        svm.partial_fit(&x, &y).unwrap();

        let more: Vec<FeatureVector> = vec![vec![3.0, 3.0].into()];
        assert!(matches!(
            svm.partial_fit(&more, &[7.0]),
            Err(SVMError::InvalidLabel(7.0))
        ));

        // A batch with a single known class is fine
        svm.partial_fit(&more, &[5.0]).unwrap();
        assert_eq!(svm.session().map(Session::len), Some(7));
    }

    #[test]
    fn test_partial_fit_applies_new_config() {
        let (x, y) = toy();
        let mut svm = LaSVM::new().with_kernel(KernelType::Linear).with_c(1.0);
        svm.partial_fit(&x[..4], &y[..4]).unwrap();

        let mut config = svm.config().clone();
        config.c = 4.0;
        config.tau = 1e-4;
        svm.set_config(config);
        svm.partial_fit(&x[4..], &y[4..]).unwrap();

        let session = svm.session().unwrap();
        assert_eq!(session.config().c, 4.0);
        assert_eq!(session.config().tau, 1e-4);
        assert_eq!(session.state().c(), 4.0);
        assert_eq!(session.len(), 6);

        // Shrinking C on a live session is refused
        let mut config = svm.config().clone();
        config.c = 0.5;
        svm.set_config(config);
        assert!(matches!(
            svm.partial_fit(&x[..1], &y[..1]),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_warm_start_restarts_on_kernel_change() {
        let (x, y) = toy();
        let mut svm = LaSVM::new().with_warm_start(true).with_gamma(0.5);
        svm.fit(&x, &y).unwrap();

        let mut config = svm.config().clone();
        config.kernel = KernelType::Linear;
        svm.set_config(config);
        svm.fit(&x, &y).unwrap();

        let kernel = svm.session().map(|s| s.kernel().kernel_type());
        assert_eq!(kernel, Some(KernelType::Linear));
        assert_eq!(svm.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_evaluation_metrics() {
        let metrics = EvaluationMetrics::new(10, 5, 2, 3);

        assert_eq!(metrics.accuracy(), 0.75); // (10+5)/(10+5+2+3)
        assert_eq!(metrics.precision(), 10.0 / 12.0); // 10/(10+2)
        assert_eq!(metrics.recall(), 10.0 / 13.0); // 10/(10+3)
        assert!(metrics.f1_score() > 0.0);
        assert_eq!(metrics.specificity(), 5.0 / 7.0); // 5/(5+2)
    }

    #[test]
    fn test_metrics_from_labels() {
        let metrics = EvaluationMetrics::from_labels(&[5.0, 5.0, 3.0, 3.0], &[5.0, 3.0, 3.0, 5.0], 5.0);
        assert_eq!(metrics, EvaluationMetrics::new(1, 1, 1, 1));
    }
}
