//! # planning-core
//!
//! A generic Monte Carlo Tree Search (MCTS) planning engine for
//! discrete-action, episodic decision processes.
//!
//! Given a simulatable [`Environment`](environment::Environment) that
//! supports reset, step and deep cloning, [`Search`](search::Search)
//! incrementally grows a [`Node`](tree::Node) tree whose statistics
//! approximate the expected discounted return reachable from a query
//! state. Callers turn the resulting tree into an action via a pluggable
//! [`TreeEvaluationPolicy`](policy::tree_eval::TreeEvaluationPolicy), and
//! may warm-start the next decision by reusing the subtree reached after
//! acting ([`Node::into_child`](tree::Node::into_child)).
//!
//! ## Basic usage
//!
//! ```
//! use planning_core::environment::{Environment, ResetOutcome, StepOutcome};
//! use planning_core::policy::evaluation::ZeroEstimator;
//! use planning_core::policy::selection::UcbPolicy;
//! use planning_core::policy::expansion::DefaultExpansion;
//! use planning_core::{SearchConfig, Search};
//!
//! // A trivial two-action environment that terminates after one step.
//! #[derive(Clone)]
//! struct OneShot { taken: bool }
//!
//! impl Environment for OneShot {
//!     type Observation = ();
//!
//!     fn action_space_size(&self) -> usize { 2 }
//!
//!     fn step(&mut self, action: usize) -> StepOutcome<()> {
//!         self.taken = true;
//!         let reward = if action == 1 { 1.0 } else { -1.0 };
//!         StepOutcome { observation: None, reward, terminated: true, truncated: false }
//!     }
//!
//!     fn reset(&mut self, _seed: u64) -> ResetOutcome<()> {
//!         self.taken = false;
//!         ResetOutcome { observation: () }
//!     }
//! }
//!
//! let env = OneShot { taken: false };
//! let config = SearchConfig::default().with_budget(50).with_seed(7);
//! let mut search = Search::new(
//!     config,
//!     UcbPolicy::new(1.0),
//!     DefaultExpansion::new(),
//!     ZeroEstimator::new(),
//! );
//!
//! let root = search.search(&env, Some(()), 0.0).unwrap();
//! assert_eq!(root.visits, 50);
//! ```

pub mod config;
pub mod environment;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;
pub mod utils;

pub use config::{ExpansionMode, SearchConfig};
pub use environment::{Environment, Predictor, ResetOutcome, StepOutcome};
pub use search::Search;
pub use stats::SearchStatistics;
pub use tree::{Node, NodePath};

/// Error types for the planning core.
#[derive(thiserror::Error, Debug)]
pub enum PlanningError {
    /// The environment's action space is not discrete, or reports `A <= 0`.
    #[error("invalid action space: {0}")]
    InvalidActionSpace(String),

    /// The environment refused to clone (fatal).
    #[error("environment clone failed: {0}")]
    CloneFailed(String),

    /// The predictor raised while evaluating an observation.
    #[error("predictor failed: {0}")]
    PredictorFailed(String),

    /// An internal consistency check failed; indicates a bug in this crate
    /// or in a caller-supplied policy, not a recoverable runtime condition.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    /// [`tree::Node::sample_unexplored_action`] was called on a node with
    /// no unexpanded actions remaining. Selection/expansion policies must
    /// avoid this; its occurrence is treated as a policy contract
    /// violation by the driver.
    #[error("node has no unexpanded actions left")]
    FullyExpanded,

    /// [`tree::Node::step`] was called with an action that has not been
    /// expanded into a child yet.
    #[error("action {0} has not been expanded")]
    UnexpandedAction(usize),
}

/// Result type for planning-core operations.
pub type Result<T> = std::result::Result<T, PlanningError>;
