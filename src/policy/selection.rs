//! Selection policies: deterministic-given-statistics functions that pick
//! which child to descend into during the selection phase, or signal that
//! the current node should be expanded instead.

use crate::environment::Environment;
use crate::policy::value_transform::{IdentityTransform, ValueTransform};
use crate::tree::Node;
use crate::utils::{puct_exploration_term, ucb_exploration_term};

/// Outcome of applying a [`SelectionPolicy`] at one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Descend into the child reached by this action.
    Descend(usize),
    /// Stop here and expand this node instead.
    ExpandHere,
}

/// Trait for policies that choose which child to explore.
///
/// A policy **must** return [`Selection::ExpandHere`] when the node is not
/// fully expanded (the two reference policies below both do). Otherwise it
/// returns the argmax over expanded actions of a score function; ties are
/// broken by the lowest action index, for determinism.
pub trait SelectionPolicy<E: Environment>: Send + Sync {
    /// Selects an action to descend into, or signals expansion.
    fn select(&self, node: &Node<E>) -> Selection;

    /// Create a boxed clone of this policy.
    fn clone_box(&self) -> Box<dyn SelectionPolicy<E>>;
}

/// Picks the argmax-scoring expanded child, breaking ties by lowest action
/// index. Shared by both reference policies below.
fn argmax_by_action<E: Environment>(
    node: &Node<E>,
    mut score: impl FnMut(usize, &Node<E>) -> f64,
) -> Selection {
    let mut best_action = None;
    let mut best_score = f64::NEG_INFINITY;

    for (action, child) in node.children() {
        let s = score(action, child);
        if s > best_score {
            best_score = s;
            best_action = Some(action);
        }
    }

    match best_action {
        Some(action) => Selection::Descend(action),
        // A fully-expanded node always has at least one child when A >= 1;
        // this is unreachable for any node with a positive action space.
        None => Selection::ExpandHere,
    }
}

/// Upper Confidence Bound selection policy.
///
/// `score(a) = child.default_value() + c * sqrt(parent.visits / child.visits)`,
/// with `c > 0` the exploration constant.
#[derive(Debug, Clone)]
pub struct UcbPolicy {
    /// Exploration constant `c`. Higher values favor less-visited children.
    pub exploration_constant: f64,
}

impl UcbPolicy {
    /// Creates a new UCB policy with the given exploration constant.
    pub fn new(exploration_constant: f64) -> Self {
        UcbPolicy { exploration_constant }
    }
}

impl<E: Environment> SelectionPolicy<E> for UcbPolicy {
    fn select(&self, node: &Node<E>) -> Selection {
        if !node.is_fully_expanded() {
            return Selection::ExpandHere;
        }

        argmax_by_action(node, |_action, child| {
            child.default_value()
                + ucb_exploration_term(node.visits, child.visits, self.exploration_constant)
        })
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy<E>> {
        Box::new(self.clone())
    }
}

/// PUCT (Predictor + UCB applied to Trees) selection policy, prior-weighted
/// using a learned estimator's action distribution.
///
/// `score(a) = τ(child.default_value()) + c * prior[a] * sqrt(parent.visits) / (1 + child.visits)`.
///
/// `prior` is read from the node being selected from (`n` in the formula
/// above, i.e. the parent of the children being scored) — this is where a
/// learned value estimator stores the distribution it predicted over `n`'s
/// own actions. If no prior was ever set (e.g. a non-learned estimator is
/// paired with this policy by mistake), a uniform prior is assumed.
pub struct PuctPolicy {
    /// Exploration constant `c`.
    pub exploration_constant: f64,
    value_transform: Box<dyn ValueTransform>,
}

impl PuctPolicy {
    /// Creates a PUCT policy using the identity value transform.
    pub fn new(exploration_constant: f64) -> Self {
        PuctPolicy {
            exploration_constant,
            value_transform: Box::new(IdentityTransform::new()),
        }
    }

    /// Creates a PUCT policy using a custom value transform (e.g. min-max
    /// or z-score normalization of `default_value()` before it enters the
    /// score).
    pub fn with_transform(exploration_constant: f64, value_transform: Box<dyn ValueTransform>) -> Self {
        PuctPolicy {
            exploration_constant,
            value_transform,
        }
    }
}

impl<E: Environment> SelectionPolicy<E> for PuctPolicy {
    fn select(&self, node: &Node<E>) -> Selection {
        if !node.is_fully_expanded() {
            return Selection::ExpandHere;
        }

        let uniform_prior = 1.0 / node.action_space_size() as f32;

        argmax_by_action(node, |action, child| {
            let prior = node
                .prior
                .as_ref()
                .and_then(|p| p.get(action).copied())
                .unwrap_or(uniform_prior);

            self.value_transform.apply(child.default_value())
                + puct_exploration_term(node.visits, child.visits, prior, self.exploration_constant)
        })
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy<E>> {
        Box::new(PuctPolicy {
            exploration_constant: self.exploration_constant,
            value_transform: self.value_transform.clone_box(),
        })
    }
}

impl Default for PuctPolicy {
    fn default() -> Self {
        Self::new(1.414)
    }
}

impl<E: Environment> SelectionPolicy<E> for Box<dyn SelectionPolicy<E>> {
    fn select(&self, node: &Node<E>) -> Selection {
        (**self).select(node)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy<E>> {
        (**self).clone_box()
    }
}
