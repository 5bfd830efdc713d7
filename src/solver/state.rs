//! Gradient state and active index set
//!
//! Every example slot carries a signed coefficient `alpha`, box bounds
//! `A <= alpha <= B` with `A = min(0, C·w·y)` and `B = max(0, C·w·y)`, and,
//! while it is active, its gradient `g = y - Σ_k alpha_k K(·, k)`.
//!
//! The active set is a dense list of slot ids plus a per-slot position table,
//! so admission is a push and removal a swap-remove.

use crate::solver::KernelMatrix;

#[derive(Debug, Clone, Default)]
pub struct GradientState {
    labels: Vec<f64>,
    weights: Vec<f64>,
    alpha: Vec<f64>,
    gradient: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    active: Vec<usize>,
    position: Vec<Option<usize>>,
    c: f64,
}

impl GradientState {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Append slots with labels in {-1, +1} and positive weights; they start
    /// inactive with zero coefficient
    pub fn extend(&mut self, labels: &[f64], weights: &[f64]) {
        debug_assert_eq!(labels.len(), weights.len());
        for (&y, &w) in labels.iter().zip(weights) {
            let (lower, upper) = Self::bounds(self.c, y, w);
            self.labels.push(y);
            self.weights.push(w);
            self.alpha.push(0.0);
            self.gradient.push(0.0);
            self.lower.push(lower);
            self.upper.push(upper);
            self.position.push(None);
        }
    }

    fn bounds(c: f64, y: f64, w: f64) -> (f64, f64) {
        let edge = c * w * y;
        (edge.min(0.0), edge.max(0.0))
    }

    /// Change the box constraint. Only growth keeps the current coefficients
    /// feasible, so callers must not shrink it.
    pub fn set_c(&mut self, c: f64) {
        debug_assert!(c >= self.c, "C may only grow on a live session");
        self.c = c;
        for s in 0..self.labels.len() {
            let (lower, upper) = Self::bounds(c, self.labels[s], self.weights[s]);
            self.lower[s] = lower;
            self.upper[s] = upper;
        }
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, s: usize) -> f64 {
        self.labels[s]
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn weight(&self, s: usize) -> f64 {
        self.weights[s]
    }

    pub fn alpha(&self, s: usize) -> f64 {
        self.alpha[s]
    }

    /// Gradient of an active slot
    pub fn gradient(&self, s: usize) -> f64 {
        debug_assert!(self.is_active(s), "gradient of inactive slot {s} is not maintained");
        self.gradient[s]
    }

    pub fn lower(&self, s: usize) -> f64 {
        self.lower[s]
    }

    pub fn upper(&self, s: usize) -> f64 {
        self.upper[s]
    }

    /// Room left to increase alpha
    pub fn room_up(&self, s: usize) -> f64 {
        self.upper[s] - self.alpha[s]
    }

    /// Room left to decrease alpha
    pub fn room_down(&self, s: usize) -> f64 {
        self.alpha[s] - self.lower[s]
    }

    pub fn can_increase(&self, s: usize) -> bool {
        self.alpha[s] < self.upper[s]
    }

    pub fn can_decrease(&self, s: usize) -> bool {
        self.alpha[s] > self.lower[s]
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn is_active(&self, s: usize) -> bool {
        self.position[s].is_some()
    }

    /// Gradient of any slot computed from the current coefficients
    pub fn compute_gradient(&self, kernel: &mut KernelMatrix, s: usize) -> f64 {
        let mut sum = 0.0;
        for &k in &self.active {
            let a = self.alpha[k];
            if a != 0.0 {
                sum += a * kernel.eval(k, s);
            }
        }
        self.labels[s] - sum
    }

    /// Add slot `s` to the active set with its freshly computed gradient
    pub fn admit(&mut self, s: usize, gradient: f64) {
        if self.position[s].is_some() {
            return;
        }
        self.position[s] = Some(self.active.len());
        self.active.push(s);
        self.gradient[s] = gradient;
    }

    /// Remove slot `s` from the active set. Its coefficient must be zero.
    pub fn remove(&mut self, s: usize) {
        debug_assert_eq!(self.alpha[s], 0.0, "removing slot {s} with non-zero alpha");
        let Some(pos) = self.position[s].take() else {
            return;
        };
        self.active.swap_remove(pos);
        if let Some(&moved) = self.active.get(pos) {
            self.position[moved] = Some(pos);
        }
    }

    /// Drop every active slot whose coefficient is exactly zero; returns how
    /// many were removed
    pub fn prune_zero_alphas(&mut self) -> usize {
        let zero: Vec<usize> = self
            .active
            .iter()
            .copied()
            .filter(|&s| self.alpha[s] == 0.0)
            .collect();
        for &s in &zero {
            self.remove(s);
        }
        zero.len()
    }

    /// Number of non-zero coefficients
    pub fn nonzero_count(&self) -> usize {
        self.active.iter().filter(|&&s| self.alpha[s] != 0.0).count()
    }

    pub fn alpha_sum(&self) -> f64 {
        self.active.iter().map(|&s| self.alpha[s]).sum()
    }

    /// Move the pair to `alpha_i` and `alpha_j` and apply
    /// `g_k -= delta_i·K(i,k) + delta_j·K(j,k)` for every active `k`, where
    /// the deltas are the differences actually stored.
    ///
    /// Both slots must be active and both targets inside their box.
    pub fn update(
        &mut self,
        kernel: &mut KernelMatrix,
        i: usize,
        j: usize,
        alpha_i: f64,
        alpha_j: f64,
    ) {
        debug_assert!(self.is_active(i) && self.is_active(j));
        debug_assert!(self.lower[i] <= alpha_i && alpha_i <= self.upper[i]);
        debug_assert!(self.lower[j] <= alpha_j && alpha_j <= self.upper[j]);
        let delta_i = alpha_i - self.alpha[i];
        let delta_j = alpha_j - self.alpha[j];
        self.alpha[i] = alpha_i;
        self.alpha[j] = alpha_j;

        for idx in 0..self.active.len() {
            let k = self.active[idx];
            let k_ik = kernel.eval(i, k);
            let k_jk = kernel.eval(j, k);
            self.gradient[k] -= delta_i * k_ik + delta_j * k_jk;
        }
    }
}
