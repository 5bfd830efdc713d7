//! Stopping rules for a training run

use crate::core::{SolverConfig, Termination};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Minimum number of consecutive stalled phases before a run is declared stagnant
const MIN_STALLS: usize = 10;

/// Why a training run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Global duality gap fell below tau
    Converged,
    /// The requested number of non-zero coefficients was reached
    TargetReached,
    /// The pass budget ran out
    MaxIterations,
    /// The wall-clock limit ran out
    TimeLimit,
    /// Repeated direction searches made no progress
    Stagnated,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationReason::Converged => "converged",
            TerminationReason::TargetReached => "target reached",
            TerminationReason::MaxIterations => "max iterations",
            TerminationReason::TimeLimit => "time limit",
            TerminationReason::Stagnated => "stagnated",
        };
        f.write_str(name)
    }
}

/// Evaluates the configured stopping rules against solver progress
pub struct TerminationController {
    termination: Termination,
    tau: f64,
    n_components: Option<usize>,
    max_iter: usize,
    time_limit: Option<Duration>,
    started: Instant,
}

impl TerminationController {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            termination: config.termination,
            tau: config.tau,
            n_components: config.n_components,
            max_iter: config.max_iter,
            time_limit: config.time_limit,
            started: Instant::now(),
        }
    }

    /// Checked after every PROCESS step and every REPROCESS phase
    pub fn after_step(&self, n_nonzero: usize) -> Option<TerminationReason> {
        if self.target_reached(n_nonzero) {
            return Some(TerminationReason::TargetReached);
        }
        if self.time_exceeded() {
            return Some(TerminationReason::TimeLimit);
        }
        None
    }

    /// Checked once a full pass over the data is done
    pub fn after_pass(&self, pass: usize, global_gap: f64) -> Option<TerminationReason> {
        if self.termination == Termination::Gap && global_gap <= self.tau {
            return Some(TerminationReason::Converged);
        }
        if pass >= self.max_iter {
            return Some(TerminationReason::MaxIterations);
        }
        None
    }

    /// `stalls` consecutive phases without progress on `n_active` active slots
    pub fn stagnated(&self, stalls: usize, n_active: usize) -> bool {
        stalls >= MIN_STALLS.max(2 * n_active)
    }

    /// Requested number of non-zero coefficients, when that is the stopping rule
    pub fn target(&self) -> Option<usize> {
        match self.termination {
            Termination::NComponents => self.n_components,
            _ => None,
        }
    }

    pub fn target_reached(&self, n_nonzero: usize) -> bool {
        self.target().map_or(false, |k| n_nonzero >= k)
    }

    pub fn time_exceeded(&self) -> bool {
        self.time_limit
            .map_or(false, |limit| self.started.elapsed() >= limit)
    }

    /// Whether the finishing REPROCESS loop should run after `reason`
    pub fn wants_finish(&self, finish_step: bool, reason: TerminationReason) -> bool {
        finish_step
            && self.termination != Termination::NComponents
            && reason != TerminationReason::TimeLimit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
