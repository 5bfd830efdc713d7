//! Online training session
//!
//! A [`Session`] owns everything that survives between calls to `fit` when
//! warm starting: the example arena with its kernel cache, the coefficients,
//! the gradients of the active slots, and the selection state.
//!
//! One training run alternates PROCESS (admit a new slot and optimize it
//! against its best partner) and REPROCESS (optimize the most violating
//! active pair, then drop slots whose coefficient returned to zero). A pass
//! is a sweep of the selection policy over the data; once every slot is
//! active a pass is REPROCESS alone. After each pass the global gap is
//! checked. An optional finishing loop of REPROCESS steps tightens the
//! solution once the passes stop.
//!
//! With a target number of support vectors the run stops the moment the
//! count reaches it. A pass that ends below the target is followed by a
//! fill phase that gives the least violating inactive slots a small
//! coefficient, one new support vector per step.

use crate::cache::CacheStats;
use crate::core::{FeatureVector, Result, SVMError, SolverConfig};
use crate::kernel::KernelFunction;
use crate::model::Model;
use crate::solver::selection::{self, Extremes, Selector};
use crate::solver::termination::{TerminationController, TerminationReason};
use crate::solver::update::{pairwise_step, StepOutcome, MIN_STEP};
use crate::solver::{GradientState, KernelMatrix};
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Finishing loop cap: `FINISH_BASE + FINISH_PER_SLOT * n` direction searches
const FINISH_BASE: usize = 1_000;
const FINISH_PER_SLOT: usize = 100;

/// Fill steps move a coefficient by this fraction of its box
const FILL_FRACTION: f64 = 1e-3;

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Processing,
    Reprocessing,
    Finished,
}

/// Outcome of one REPROCESS phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprocessOutcome {
    /// Direction searches that moved the coefficients
    pub updates: usize,
    /// Slots removed from the active set
    pub pruned: usize,
    /// No τ-violating pair was left
    pub converged: bool,
}

/// Summary of one training run
#[derive(Debug, Clone)]
pub struct FitReport {
    pub reason: TerminationReason,
    pub passes: usize,
    pub updates: usize,
    pub n_support: usize,
    pub n_active: usize,
    pub gap: f64,
    pub bias: f64,
    pub elapsed: Duration,
    pub kernel_evaluations: u64,
    pub cache: CacheStats,
}

pub struct Session {
    config: SolverConfig,
    kernel: KernelMatrix,
    state: GradientState,
    selector: Selector,
    phase: SessionPhase,
    bias: f64,
    gap: f64,
    updates: usize,
    stalls: usize,
}

impl Session {
    /// Create a session over `examples` with labels in {-1, +1} and positive
    /// sample weights
    pub fn new(
        kernel: KernelFunction,
        config: SolverConfig,
        examples: Vec<FeatureVector>,
        labels: Vec<f64>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if examples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        check_slots(&examples, &labels, &weights)?;

        let kernel = KernelMatrix::new(kernel, examples, config.cache_size);
        let mut state = GradientState::new(config.c);
        state.extend(&labels, &weights);
        let selector = Selector::new(&config);

        debug!(
            "New session: {} examples, C = {}, kernel = {:?}",
            state.len(),
            config.c,
            kernel.kernel()
        );

        Ok(Self {
            config,
            kernel,
            state,
            selector,
            phase: SessionPhase::Idle,
            bias: 0.0,
            gap: 0.0,
            updates: 0,
            stalls: 0,
        })
    }

    /// Append examples to the arena. Existing coefficients, gradients and
    /// cached kernel rows are kept; the new slots start inactive.
    pub fn extend(
        &mut self,
        examples: Vec<FeatureVector>,
        labels: Vec<f64>,
        weights: Vec<f64>,
    ) -> Result<()> {
        check_slots(&examples, &labels, &weights)?;
        if examples.is_empty() {
            return Ok(());
        }
        debug!("Extending session by {} examples", examples.len());
        self.kernel.extend(examples);
        self.state.extend(&labels, &weights);
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Apply a new solver configuration to a live session. C may grow but
    /// never shrink, since the current coefficients would leave the box.
    pub fn reconfigure(&mut self, config: SolverConfig) -> Result<()> {
        if config.c < self.state.c() {
            return Err(SVMError::InvalidParameter(format!(
                "C cannot shrink on a live session ({} -> {})",
                self.state.c(),
                config.c
            )));
        }
        if config.c > self.state.c() {
            self.state.set_c(config.c);
        }
        if config.cache_size != self.config.cache_size {
            debug!("Cache size change takes effect on the next cold start");
        }
        self.selector.reconfigure(&config);
        self.config = config;
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Train until one of the stopping rules fires
    pub fn run(&mut self) -> FitReport {
        let controller = TerminationController::new(&self.config);
        let n = self.state.len();
        let updates_before = self.updates;
        self.stalls = 0;

        info!(
            "Training on {} examples ({} active, {} support vectors)",
            n,
            self.state.active().len(),
            self.state.nonzero_count()
        );

        let mut passes = 0;
        let mut reason = controller.after_step(self.state.nonzero_count());
        while reason.is_none() {
            passes += 1;
            reason = self.run_pass(&controller);
            if reason.is_some() {
                break;
            }
            if let Some(target) = controller.target() {
                if self.state.nonzero_count() < target {
                    reason = self.fill(&controller, target);
                    if reason.is_some() {
                        break;
                    }
                }
            }

            let global_gap = self.global_gap();
            debug!(
                "Pass {}: {} active, {} support vectors, gap = {:.6}, global gap = {:.6}",
                passes,
                self.state.active().len(),
                self.state.nonzero_count(),
                self.gap,
                global_gap
            );
            reason = controller.after_pass(passes, global_gap);
        }
        let reason = reason.unwrap_or(TerminationReason::MaxIterations);

        if controller.wants_finish(self.config.finish_step, reason) {
            self.finish(&controller);
        }

        self.phase = SessionPhase::Finished;
        self.refresh_bias();
        debug_assert!(
            self.state.alpha_sum().abs() <= 1e-8 * self.state.c().max(1.0) * n as f64,
            "sum of coefficients drifted to {}",
            self.state.alpha_sum()
        );

        let report = FitReport {
            reason,
            passes,
            updates: self.updates - updates_before,
            n_support: self.state.nonzero_count(),
            n_active: self.state.active().len(),
            gap: self.gap,
            bias: self.bias,
            elapsed: controller.elapsed(),
            kernel_evaluations: self.kernel.evaluations(),
            cache: self.kernel.cache_stats(),
        };
        info!(
            "Training stopped ({}) after {} passes: {} support vectors, {} updates, gap = {:.6}",
            report.reason, report.passes, report.n_support, report.updates, report.gap
        );
        debug!(
            "Kernel: {} evaluations, cache hit rate {:.1}%",
            report.kernel_evaluations,
            report.cache.hit_rate() * 100.0
        );
        report
    }

    fn run_pass(&mut self, controller: &TerminationController) -> Option<TerminationReason> {
        self.selector.start_pass(self.state.len());
        let mut examined = 0;
        while let Some(s) = self
            .selector
            .next_candidate(&mut self.kernel, &self.state, self.bias)
        {
            examined += 1;
            self.process(s);
            if let Some(reason) = controller.after_step(self.state.nonzero_count()) {
                return Some(reason);
            }

            self.reprocess();
            if let Some(reason) = self.check_reprocess(controller) {
                return Some(reason);
            }
        }

        if examined == 0 {
            return self.reprocess_pass(controller);
        }
        None
    }

    /// A pass over a fully active set: REPROCESS until no τ-violating pair
    /// is left or nothing moves
    fn reprocess_pass(&mut self, controller: &TerminationController) -> Option<TerminationReason> {
        let cap = FINISH_PER_SLOT * self.state.len();
        let mut done = 0;
        while done < cap {
            let outcome = self.reprocess();
            done += outcome.updates;
            if let Some(reason) = self.check_reprocess(controller) {
                return Some(reason);
            }
            if outcome.converged || outcome.updates == 0 {
                break;
            }
        }
        trace!("Reprocess-only pass: {done} updates, gap = {:.6}", self.gap);
        None
    }

    fn check_reprocess(&self, controller: &TerminationController) -> Option<TerminationReason> {
        if let Some(reason) = controller.after_step(self.state.nonzero_count()) {
            return Some(reason);
        }
        if controller.stagnated(self.stalls, self.state.active().len()) {
            warn!("No progress after {} consecutive attempts", self.stalls);
            return Some(TerminationReason::Stagnated);
        }
        None
    }

    /// Grow the support set to `target`. Each step admits the inactive slot
    /// closest to violating optimality and moves it off zero against a
    /// partner that stays non-zero, so the count rises by exactly one.
    fn fill(&mut self, controller: &TerminationController, target: usize) -> Option<TerminationReason> {
        self.state.prune_zero_alphas();
        debug!(
            "Filling from {} to {} support vectors",
            self.state.nonzero_count(),
            target
        );
        while self.state.nonzero_count() < target {
            let Some((s, g)) = selection::closest_inactive(&mut self.kernel, &self.state) else {
                break;
            };
            if !self.fill_step(s, g) {
                break;
            }
            if let Some(reason) = controller.after_step(self.state.nonzero_count()) {
                self.refresh_bias();
                return Some(reason);
            }
        }
        self.refresh_bias();
        None
    }

    fn fill_step(&mut self, s: usize, g: f64) -> bool {
        self.state.admit(s, g);
        let Some((i, j)) = selection::partner_for(&self.state, s) else {
            self.state.remove(s);
            return false;
        };
        let partner_room = if i == s {
            self.state.room_down(j)
        } else {
            self.state.room_up(i)
        };
        let own_room = self.state.upper(s) - self.state.lower(s);
        let step = (FILL_FRACTION * own_room).min(0.5 * partner_room);
        if step < MIN_STEP {
            self.state.remove(s);
            return false;
        }

        let alpha_i = self.state.alpha(i) + step;
        let alpha_j = self.state.alpha(j) - step;
        self.state.update(&mut self.kernel, i, j, alpha_i, alpha_j);
        self.updates += 1;
        trace!("Fill step on ({i}, {j}): {step:.6e}");
        true
    }

    /// PROCESS: admit slot `s` and optimize it against its best partner
    pub fn process(&mut self, s: usize) -> StepOutcome {
        if self.state.is_active(s) {
            return StepOutcome::NoProgress;
        }
        self.phase = SessionPhase::Processing;

        if self.state.nonzero_count() == 0 {
            return self.seed(s);
        }

        let g = self.state.compute_gradient(&mut self.kernel, s);
        self.state.admit(s, g);

        let Some((i, j)) = selection::partner_for(&self.state, s) else {
            return StepOutcome::NoProgress;
        };
        if self.state.gradient(i) - self.state.gradient(j) <= self.config.tau {
            return StepOutcome::NoProgress;
        }
        self.step(i, j)
    }

    /// With no support vector yet, pair `s` with the next slot of the other
    /// class so the first step has somewhere to go
    fn seed(&mut self, s: usize) -> StepOutcome {
        let n = self.state.len();
        let y = self.state.label(s);
        let Some(other) = (1..n)
            .map(|offset| (s + offset) % n)
            .find(|&o| self.state.label(o) != y)
        else {
            return StepOutcome::NoProgress;
        };

        for slot in [s, other] {
            if !self.state.is_active(slot) {
                let g = self.state.compute_gradient(&mut self.kernel, slot);
                self.state.admit(slot, g);
            }
        }
        let (i, j) = if y > 0.0 { (s, other) } else { (other, s) };
        trace!("Seeding with slots {i} and {j}");
        self.step(i, j)
    }

    fn step(&mut self, i: usize, j: usize) -> StepOutcome {
        let outcome = pairwise_step(&mut self.state, &mut self.kernel, i, j);
        if let StepOutcome::Progress { step, clipped } = outcome {
            self.updates += 1;
            trace!("Step on ({i}, {j}): {step:.6e}{}", if clipped { " (clipped)" } else { "" });
        }
        outcome
    }

    /// REPROCESS: up to `reprocess_budget` direction searches on the most
    /// violating active pair, then prune zero coefficients and refresh the
    /// bias
    pub fn reprocess(&mut self) -> ReprocessOutcome {
        self.phase = SessionPhase::Reprocessing;
        let mut updates = 0;
        let mut excluded: Vec<usize> = Vec::new();
        let mut converged = false;

        while updates < self.config.reprocess_budget {
            let pair = match selection::most_violating_pair(&self.state, &excluded) {
                Some(pair) if pair.gap > self.config.tau => pair,
                _ => {
                    converged = excluded.is_empty();
                    break;
                }
            };

            if self.step(pair.i, pair.j).is_progress() {
                updates += 1;
                self.stalls = 0;
                continue;
            }

            // Stalled pair: leave out whichever side has no room and try the next one
            self.stalls += 1;
            let before = excluded.len();
            if self.state.room_up(pair.i) < MIN_STEP {
                excluded.push(pair.i);
            }
            if self.state.room_down(pair.j) < MIN_STEP {
                excluded.push(pair.j);
            }
            if excluded.len() == before {
                excluded.push(pair.i);
                excluded.push(pair.j);
            }
        }

        let pruned = self.state.prune_zero_alphas();
        self.refresh_bias();
        if pruned > 0 {
            trace!("Pruned {pruned} slots, {} active", self.state.active().len());
        }
        ReprocessOutcome {
            updates,
            pruned,
            converged,
        }
    }

    /// Finishing loop: REPROCESS until the active gap is within tau
    fn finish(&mut self, controller: &TerminationController) {
        let cap = FINISH_BASE + FINISH_PER_SLOT * self.state.len();
        let mut done = 0;
        loop {
            if controller.time_exceeded() {
                debug!("Finishing stopped by the time limit after {done} updates");
                return;
            }
            let outcome = self.reprocess();
            done += outcome.updates;
            if outcome.converged || outcome.updates == 0 {
                debug!("Finishing done after {done} updates, gap = {:.6}", self.gap);
                return;
            }
            if done >= cap {
                warn!("Finishing step hit its cap of {cap} updates, gap = {:.6}", self.gap);
                return;
            }
        }
    }

    fn refresh_bias(&mut self) {
        let found = selection::extremes(&self.state, &[]);
        self.bias = found.bias();
        self.gap = found.gap();
    }

    /// Duality gap over every slot; inactive slots count with a zero
    /// coefficient and a freshly computed gradient
    pub fn global_gap(&mut self) -> f64 {
        let mut found = Extremes::default();
        for s in 0..self.state.len() {
            let g = if self.state.is_active(s) {
                self.state.gradient(s)
            } else {
                self.state.compute_gradient(&mut self.kernel, s)
            };
            let y = self.state.label(s);
            let can_increase = if self.state.is_active(s) { self.state.can_increase(s) } else { y > 0.0 };
            let can_decrease = if self.state.is_active(s) { self.state.can_decrease(s) } else { y < 0.0 };
            if can_increase && found.max.map_or(true, |(_, gmax)| g > gmax) {
                found.max = Some((s, g));
            }
            if can_decrease && found.min.map_or(true, |(_, gmin)| g < gmin) {
                found.min = Some((s, g));
            }
        }
        found.gap()
    }

    /// Snapshot the current solution as a predictive model
    pub fn model(&self, classes: [f64; 2], n_features: usize) -> Result<Model> {
        let mut support: Vec<usize> = self
            .state
            .active()
            .iter()
            .copied()
            .filter(|&s| self.state.alpha(s) != 0.0)
            .collect();
        support.sort_unstable();

        let support_vectors = support.iter().map(|&s| self.kernel.example(s).clone()).collect();
        let coefficients = support.iter().map(|&s| self.state.alpha(s)).collect();
        Model::new(
            self.kernel.kernel().clone(),
            self.bias,
            support_vectors,
            coefficients,
            classes,
            n_features,
        )
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Gap between the extreme gradients of the active set
    pub fn gap(&self) -> f64 {
        self.gap
    }

    pub fn n_support(&self) -> usize {
        self.state.nonzero_count()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> &GradientState {
        &self.state
    }

    pub fn kernel(&self) -> &KernelFunction {
        self.kernel.kernel()
    }

    pub fn examples(&self) -> &[FeatureVector] {
        self.kernel.examples()
    }
}

fn check_slots(examples: &[FeatureVector], labels: &[f64], weights: &[f64]) -> Result<()> {
    if examples.len() != labels.len() || examples.len() != weights.len() {
        return Err(SVMError::InvalidDataset(format!(
            "{} examples, {} labels and {} weights",
            examples.len(),
            labels.len(),
            weights.len()
        )));
    }
    if let Some(&y) = labels.iter().find(|&&y| y != 1.0 && y != -1.0) {
        return Err(SVMError::InvalidLabel(y));
    }
    if let Some(&w) = weights.iter().find(|&&w| !(w.is_finite() && w > 0.0)) {
        return Err(SVMError::InvalidParameter(format!(
            "Sample weights must be positive and finite, got: {w}"
        )));
    }
    Ok(())
}
