//! Configuration options for the planning core.
//!
//! This module defines the parameters that control how [`crate::Search`]
//! grows a tree: the discount factor used by backup, the iteration/time
//! budget, how many actions are expanded per visit to a leaf, and the RNG
//! seed every stochastic choice in the core is drawn from.

use std::time::Duration;

/// How many unexpanded actions are materialized the first time the
/// traversal reaches a leaf that is not fully expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Expand exactly one action, chosen by the expansion policy. The
    /// classic MCTS shape; pairs naturally with rollout-based value
    /// estimators.
    SingleChild,

    /// Expand every unexpanded action in one visit to the leaf. Used with
    /// learned value estimators that produce a full action prior in one
    /// call, so there is no reason to hold any action back.
    AllChildren,
}

/// Configuration for a [`crate::Search`] run.
///
/// Use the builder methods to customize; [`Default`] picks conservative
/// defaults (no time limit, single-child expansion).
///
/// # Example
///
/// ```
/// use planning_core::SearchConfig;
/// use std::time::Duration;
///
/// let config = SearchConfig::default()
///     .with_discount_factor(0.9)
///     .with_budget(800)
///     .with_max_time(Duration::from_millis(500))
///     .with_seed(42);
/// ```
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Discount factor `γ ∈ (0, 1]` applied during backup.
    pub discount_factor: f64,

    /// Number of iterations `search()` runs before stopping (the budget in
    /// spec terms): `search` terminates once `root.visits >= budget`.
    pub budget: u64,

    /// If set, `search()` also stops once this much wall-clock time has
    /// elapsed, even if the iteration budget has not been exhausted.
    pub max_time: Option<Duration>,

    /// How many actions to expand per visit to a non-fully-expanded leaf.
    pub expansion_mode: ExpansionMode,

    /// Step budget for the random-rollout value estimator. Unused by other
    /// estimators.
    pub rollout_budget: usize,

    /// Seed for the RNG stream every stochastic choice in the core (action
    /// sampling, rollout actions) draws from. Fixing this is necessary, but
    /// not sufficient on its own, for determinism across runs — see
    /// `SPEC_FULL.md` §8 property 6.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            discount_factor: 1.0,
            budget: 1_000,
            max_time: None,
            expansion_mode: ExpansionMode::SingleChild,
            rollout_budget: 40,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// Sets the discount factor `γ`.
    pub fn with_discount_factor(mut self, gamma: f64) -> Self {
        self.discount_factor = gamma;
        self
    }

    /// Sets the iteration budget.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Sets a wall-clock cutoff in addition to the iteration budget.
    pub fn with_max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    /// Sets the expansion mode.
    pub fn with_expansion_mode(mut self, mode: ExpansionMode) -> Self {
        self.expansion_mode = mode;
        self
    }

    /// Sets the rollout step budget used by [`crate::policy::evaluation::RandomRolloutEstimator`].
    pub fn with_rollout_budget(mut self, budget: usize) -> Self {
        self.rollout_budget = budget;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
