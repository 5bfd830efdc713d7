//! Pairwise direction search
//!
//! Moves `alpha_i` up and `alpha_j` down by the same amount, which keeps
//! `Σ alpha = 0`. The step is the unconstrained Newton step along the pair
//! direction clipped to the box of both coefficients. A coefficient whose
//! bound limited the step is placed exactly on that bound.

use crate::solver::{GradientState, KernelMatrix};

/// Floor applied to the curvature `K_ii + K_jj - 2K_ij`
pub const MIN_CURVATURE: f64 = 1e-12;

/// Steps shorter than this are treated as no progress
pub const MIN_STEP: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Coefficients moved by `step`; `clipped` is set when a box bound
    /// limited the move
    Progress { step: f64, clipped: bool },
    /// Nothing was changed
    NoProgress,
}

impl StepOutcome {
    pub fn is_progress(&self) -> bool {
        matches!(self, StepOutcome::Progress { .. })
    }
}

/// Perform one direction search on the active pair `(i, j)`
pub fn pairwise_step(
    state: &mut GradientState,
    kernel: &mut KernelMatrix,
    i: usize,
    j: usize,
) -> StepOutcome {
    if i == j {
        return StepOutcome::NoProgress;
    }

    let room_i = state.room_up(i);
    let room_j = state.room_down(j);
    if room_i <= 0.0 || room_j <= 0.0 {
        return StepOutcome::NoProgress;
    }

    let descent = state.gradient(i) - state.gradient(j);
    if descent <= 0.0 {
        return StepOutcome::NoProgress;
    }

    let curvature = (kernel.diag(i) + kernel.diag(j) - 2.0 * kernel.eval(i, j)).max(MIN_CURVATURE);
    let newton = descent / curvature;
    let step = newton.min(room_i).min(room_j);
    if step < MIN_STEP {
        return StepOutcome::NoProgress;
    }

    let alpha_i = if step == room_i {
        state.upper(i)
    } else {
        state.alpha(i) + step
    };
    let alpha_j = if step == room_j {
        state.lower(j)
    } else {
        state.alpha(j) - step
    };
    state.update(kernel, i, j, alpha_i, alpha_j);
    StepOutcome::Progress {
        step,
        clipped: step < newton,
    }
}
