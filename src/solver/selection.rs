//! Candidate and pair selection
//!
//! Two kinds of choices are made here:
//!
//! * which inactive slot PROCESS looks at next ([`Selector`], driven by the
//!   configured [`Selection`] policy)
//! * which active pair REPROCESS optimizes ([`most_violating_pair`]) and
//!   which partner PROCESS pairs a new slot with ([`partner_for`])
//!
//! All ties are broken towards the lower slot index so runs are reproducible.

use crate::core::{LossKind, Selection, SolverConfig};
use crate::solver::{GradientState, KernelMatrix};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Largest gradient among slots that can still increase and smallest among
/// slots that can still decrease
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extremes {
    pub max: Option<(usize, f64)>,
    pub min: Option<(usize, f64)>,
}

impl Extremes {
    /// `gmax - gmin`, or zero when one side is empty
    pub fn gap(&self) -> f64 {
        match (self.max, self.min) {
            (Some((_, gmax)), Some((_, gmin))) => gmax - gmin,
            _ => 0.0,
        }
    }

    /// `(gmax + gmin) / 2`, falling back to whichever side exists
    pub fn bias(&self) -> f64 {
        match (self.max, self.min) {
            (Some((_, gmax)), Some((_, gmin))) => 0.5 * (gmax + gmin),
            (Some((_, g)), None) | (None, Some((_, g))) => g,
            (None, None) => 0.0,
        }
    }

    fn offer(&mut self, state: &GradientState, s: usize, g: f64) {
        if state.can_increase(s) && is_better(self.max, s, g, |a, b| a > b) {
            self.max = Some((s, g));
        }
        if state.can_decrease(s) && is_better(self.min, s, g, |a, b| a < b) {
            self.min = Some((s, g));
        }
    }
}

fn is_better(current: Option<(usize, f64)>, s: usize, g: f64, wins: impl Fn(f64, f64) -> bool) -> bool {
    match current {
        None => true,
        Some((best, value)) => wins(g, value) || (g == value && s < best),
    }
}

/// Gradient extremes over the active set, skipping `excluded` slots
pub fn extremes(state: &GradientState, excluded: &[usize]) -> Extremes {
    let mut found = Extremes::default();
    for &s in state.active() {
        if !excluded.contains(&s) {
            found.offer(state, s, state.gradient(s));
        }
    }
    found
}

/// A pair `(i, j)` with `i` able to increase and `j` able to decrease
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViolatingPair {
    pub i: usize,
    pub j: usize,
    pub gap: f64,
}

/// The τ-violating pair with the largest `g_i - g_j`.
///
/// The two slots are distinct; when the same slot holds both extremes the
/// better of the two second-best pairings is returned.
pub fn most_violating_pair(state: &GradientState, excluded: &[usize]) -> Option<ViolatingPair> {
    let found = extremes(state, excluded);
    let (i, gmax) = found.max?;
    let (j, gmin) = found.min?;
    if i != j {
        return Some(ViolatingPair { i, j, gap: gmax - gmin });
    }

    let mut without = excluded.to_vec();
    without.push(i);
    let rest = extremes(state, &without);
    let with_other_j = rest.min.map(|(j2, g)| ViolatingPair { i, j: j2, gap: gmax - g });
    let with_other_i = rest.max.map(|(i2, g)| ViolatingPair { i: i2, j, gap: g - gmin });
    match (with_other_j, with_other_i) {
        (Some(a), Some(b)) => Some(if b.gap > a.gap { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Pair the freshly admitted slot `s` with the active slot that maximizes
/// the violation. Returns `(i, j)` ordered for [`pairwise_step`].
///
/// [`pairwise_step`]: crate::solver::pairwise_step
pub fn partner_for(state: &GradientState, s: usize) -> Option<(usize, usize)> {
    let excluded = [s];
    let found = extremes(state, &excluded);
    if state.label(s) > 0.0 {
        found.min.map(|(j, _)| (s, j))
    } else {
        found.max.map(|(i, _)| (i, s))
    }
}

/// The inactive slot closest to violating optimality, with its freshly
/// computed gradient
pub fn closest_inactive(kernel: &mut KernelMatrix, state: &GradientState) -> Option<(usize, f64)> {
    let found = extremes(state, &[]);
    let mut best: Option<(usize, f64, f64)> = None;
    for s in (0..state.len()).filter(|&s| !state.is_active(s)) {
        let g = state.compute_gradient(kernel, s);
        let score = violation(state.label(s), g, &found);
        if best.map_or(true, |(_, value, _)| score > value) {
            best = Some((s, score, g));
        }
    }
    best.map(|(s, _, g)| (s, g))
}

/// Chooses the inactive slot PROCESS considers next
pub struct Selector {
    policy: Selection,
    loss: LossKind,
    search_size: usize,
    cursor: usize,
    remaining: usize,
    rng: StdRng,
}

impl Selector {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            policy: config.selection,
            loss: config.loss,
            search_size: config.search_size,
            cursor: 0,
            remaining: 0,
            rng: StdRng::seed_from_u64(config.random_state),
        }
    }

    /// Pick up a new policy; the random stream continues
    pub fn reconfigure(&mut self, config: &SolverConfig) {
        self.policy = config.selection;
        self.loss = config.loss;
        self.search_size = config.search_size;
    }

    /// Start a pass over `n` slots
    pub fn start_pass(&mut self, n: usize) {
        self.cursor = 0;
        self.remaining = n;
    }

    /// Next inactive slot of the current pass, or `None` once the pass is
    /// exhausted or every slot is active
    pub fn next_candidate(
        &mut self,
        kernel: &mut KernelMatrix,
        state: &GradientState,
        bias: f64,
    ) -> Option<usize> {
        if state.active().len() >= state.len() {
            return None;
        }
        match self.policy {
            Selection::Cyclic => self.next_cyclic(state),
            Selection::Active | Selection::Loss => {
                if self.remaining == 0 {
                    return None;
                }
                self.remaining -= 1;
                self.best_of_pool(kernel, state, bias)
                    .or_else(|| self.next_cyclic(state))
            }
        }
    }

    fn next_cyclic(&mut self, state: &GradientState) -> Option<usize> {
        while self.cursor < state.len() {
            let s = self.cursor;
            self.cursor += 1;
            if !state.is_active(s) {
                return Some(s);
            }
        }
        None
    }

    fn best_of_pool(&mut self, kernel: &mut KernelMatrix, state: &GradientState, bias: f64) -> Option<usize> {
        let n = state.len();
        let amount = self.search_size.min(n);
        let pool = rand::seq::index::sample(&mut self.rng, n, amount);

        let bounds = match self.policy {
            Selection::Active => Some(extremes(state, &[])),
            _ => None,
        };

        let mut best: Option<(usize, f64)> = None;
        for s in pool.into_iter().filter(|&s| !state.is_active(s)) {
            let g = state.compute_gradient(kernel, s);
            let score = match bounds {
                Some(found) => violation(state.label(s), g, &found),
                None => {
                    let y = state.label(s);
                    self.loss.loss(y * (y - g + bias))
                }
            };
            if is_better(best, s, score, |a, b| a > b) {
                best = Some((s, score));
            }
        }
        best.map(|(s, _)| s)
    }
}

/// How strongly an inactive slot with gradient `g` violates optimality
fn violation(y: f64, g: f64, found: &Extremes) -> f64 {
    if y > 0.0 {
        found.min.map_or(g.abs(), |(_, gmin)| g - gmin)
    } else {
        found.max.map_or(g.abs(), |(_, gmax)| gmax - g)
    }
}
