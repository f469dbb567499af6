//! Pluggable policies for each phase of the planning core:
//! - Selection policies: how to choose which child to explore.
//! - Expansion policies: how to choose which unexpanded action to create.
//! - Evaluation (value estimator) policies: how to score a freshly
//!   expanded node.
//! - Tree-evaluation policies: how to turn a searched root into an action
//!   distribution once search is done.

pub mod evaluation;
pub mod expansion;
pub mod selection;
pub mod tree_eval;
pub mod value_transform;

pub use evaluation::ValueEstimator;
pub use expansion::ExpansionPolicy;
pub use selection::{Selection, SelectionPolicy};
pub use tree_eval::{ActionDistribution, TreeEvaluationPolicy};
pub use value_transform::ValueTransform;
