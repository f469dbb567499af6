//! Tree data structure grown by the search driver.
//!
//! A [`Node`] owns its children directly (no arena, no shared back-pointers);
//! the path from root to the node currently being expanded or backed-up is
//! instead recorded as a sequence of action indices ([`NodePath`]) and
//! replayed to reach the node in question. This keeps the tree an ordinary
//! owned structure — dropping the root frees the whole tree, and `step()`
//! can detach a subtree by simple ownership transfer.

use crate::environment::Environment;
use crate::{PlanningError, Result};

/// A node in the search tree.
///
/// Children are stored densely indexed by action: `children[a]` is `Some`
/// iff action `a` has been expanded. `action_space_size` is the same for
/// every node in one tree.
pub struct Node<E: Environment> {
    /// Reward received on the transition *into* this node. Zero (and
    /// meaningless) at the root.
    pub reward: f32,
    /// Observation produced on entry; absent if the transition terminated
    /// with no meaningful observation.
    pub observation: Option<E::Observation>,
    /// True iff the environment reported termination or truncation on
    /// entry to this node.
    pub terminal: bool,
    /// Number of backups that have passed through this node.
    pub visits: u64,
    /// Running sum of discounted cumulative-reward-plus-leaf-value over all
    /// visits through this node. `subtree_sum / visits` is the node's value
    /// estimate.
    pub subtree_sum: f64,
    /// Scalar produced by the value estimator the first time this node was
    /// evaluated. Immutable afterwards.
    pub value_evaluation: f32,
    /// Prior distribution over child actions, supplied by a learned value
    /// estimator. Absent for non-learned estimators. Sums to 1 when present.
    pub prior: Option<Vec<f32>>,

    action_space_size: usize,
    children: Vec<Option<Box<Node<E>>>>,
    expanded_count: usize,
    /// Deep copy of the environment in the state just after entering this
    /// node. Present iff the node has at least one unexpanded action and a
    /// cloneable environment is available. Consumed and cleared when the
    /// last unexpanded action is expanded.
    env_snapshot: Option<E>,
    /// Per-search scratch value memoized by recursive tree-evaluation
    /// policies (e.g. a softmax-with-self-probability evaluator that walks
    /// the tree depth-first). Cleared by [`Node::reset_var_val`].
    var_val: Option<f64>,
}

impl<E: Environment> Node<E> {
    /// Creates a root node from a freshly cloned environment.
    pub fn new_root(
        env_snapshot: E,
        observation: Option<E::Observation>,
        reward: f32,
        action_space_size: usize,
    ) -> Self {
        Node {
            reward,
            observation,
            terminal: false,
            visits: 0,
            subtree_sum: 0.0,
            value_evaluation: 0.0,
            prior: None,
            action_space_size,
            children: (0..action_space_size).map(|_| None).collect(),
            expanded_count: 0,
            env_snapshot: Some(env_snapshot),
            var_val: None,
        }
    }

    /// Creates a freshly expanded child node. `env_snapshot` should be
    /// `Some` whenever the environment is cloneable (`None` disables
    /// rollout-based value estimation and further expansion snapshots but
    /// still allows learned-predictor evaluation).
    pub(crate) fn new_child(
        env_snapshot: Option<E>,
        observation: Option<E::Observation>,
        reward: f32,
        terminal: bool,
        action_space_size: usize,
    ) -> Self {
        Node {
            reward,
            observation,
            terminal,
            visits: 0,
            subtree_sum: 0.0,
            value_evaluation: 0.0,
            prior: None,
            action_space_size,
            children: (0..action_space_size).map(|_| None).collect(),
            expanded_count: 0,
            env_snapshot,
            var_val: None,
        }
    }

    /// Number of discrete actions available at this node.
    pub fn action_space_size(&self) -> usize {
        self.action_space_size
    }

    /// Returns the child reached by `action`.
    ///
    /// Does not mutate statistics. Fails with [`PlanningError::UnexpandedAction`]
    /// if `action` has not been expanded.
    pub fn step(&self, action: usize) -> Result<&Node<E>> {
        self.children
            .get(action)
            .and_then(|slot| slot.as_deref())
            .ok_or(PlanningError::UnexpandedAction(action))
    }

    /// Returns a mutable reference to the child reached by `action`.
    pub(crate) fn step_mut(&mut self, action: usize) -> Result<&mut Node<E>> {
        self.children
            .get_mut(action)
            .and_then(|slot| slot.as_deref_mut())
            .ok_or(PlanningError::UnexpandedAction(action))
    }

    /// Detaches and returns the child reached by `action`, consuming this
    /// node. Used by callers that warm-start planning by promoting a
    /// subtree reached after acting as the new root, discarding the rest of
    /// the tree.
    pub fn into_child(mut self, action: usize) -> Result<Node<E>> {
        self.children
            .get_mut(action)
            .and_then(|slot| slot.take())
            .map(|boxed| *boxed)
            .ok_or(PlanningError::UnexpandedAction(action))
    }

    /// Iterates over `(action, child)` pairs for every expanded action.
    pub fn children(&self) -> impl Iterator<Item = (usize, &Node<E>)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(a, slot)| slot.as_deref().map(|c| (a, c)))
    }

    /// Number of expanded children.
    pub fn expanded_count(&self) -> usize {
        self.expanded_count
    }

    /// Uniformly samples one action index not yet expanded.
    ///
    /// Fails with [`PlanningError::FullyExpanded`] if every action has been
    /// expanded already; selection policies must only call this when
    /// [`Node::is_fully_expanded`] is false.
    pub fn sample_unexplored_action(&self, rng: &mut impl rand::Rng) -> Result<usize> {
        use rand::seq::IteratorRandom;
        self.children
            .iter()
            .enumerate()
            .filter_map(|(a, slot)| slot.is_none().then_some(a))
            .choose(rng)
            .ok_or(PlanningError::FullyExpanded)
    }

    /// Returns the unexpanded action indices, in ascending order.
    pub fn unexpanded_actions(&self) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(a, slot)| slot.is_none().then_some(a))
            .collect()
    }

    /// Returns true iff every action has a child.
    pub fn is_fully_expanded(&self) -> bool {
        self.expanded_count == self.action_space_size
    }

    /// `subtree_sum / visits`, or 0 if this node has never been visited.
    pub fn default_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.subtree_sum / self.visits as f64
        }
    }

    /// Clears the per-search scratch value used by memoizing
    /// tree-evaluation policies, recursing into every expanded child so a
    /// caller can reset a whole (sub)tree with one call on its root.
    pub fn reset_var_val(&mut self) {
        self.var_val = None;
        for slot in self.children.iter_mut().flatten() {
            slot.reset_var_val();
        }
    }

    /// Reads the per-search scratch value, if a memoizing tree-evaluation
    /// policy has set one for this node yet in the current traversal.
    pub fn var_val(&self) -> Option<f64> {
        self.var_val
    }

    /// Sets the per-search scratch value. Exposed so that custom
    /// [`crate::policy::tree_eval::TreeEvaluationPolicy`] implementations
    /// that recurse through the tree (unlike the bundled visit-count and
    /// Q-softmax policies, which only look at immediate children) have
    /// somewhere to memoize a partial result per node.
    pub fn set_var_val(&mut self, value: f64) {
        self.var_val = Some(value);
    }

    /// Takes the environment snapshot, if any is still held. Used by value
    /// estimators (rollout) and the search driver (expansion); leaves
    /// `None` behind so callers must re-clone if they still need one.
    pub(crate) fn take_env_snapshot(&mut self) -> Option<E> {
        self.env_snapshot.take()
    }

    /// Borrows the environment snapshot without consuming it.
    pub(crate) fn env_snapshot(&self) -> Option<&E> {
        self.env_snapshot.as_ref()
    }

    pub(crate) fn set_env_snapshot(&mut self, env: Option<E>) {
        self.env_snapshot = env;
    }

    /// Inserts a newly created child at `action`, returning an error if the
    /// slot was already occupied (an [`PlanningError::InvariantViolation`] —
    /// this indicates a bug in the caller, since `search` only expands
    /// unexpanded actions).
    pub(crate) fn insert_child(&mut self, action: usize, child: Node<E>) -> Result<()> {
        let slot = self
            .children
            .get_mut(action)
            .ok_or_else(|| PlanningError::InvariantViolation(format!("action {action} out of range")))?;
        if slot.is_some() {
            return Err(PlanningError::InvariantViolation(format!(
                "action {action} already expanded"
            )));
        }
        *slot = Some(Box::new(child));
        self.expanded_count += 1;
        Ok(())
    }
}

/// A sequence of action indices describing a path from the root of a tree
/// to one of its descendants.
///
/// Used both to record the selection phase's descent (so the driver can
/// re-enter the same node mutably for expansion) and, implicitly, as the
/// walk replayed in reverse during backup.
#[derive(Debug, Clone, Default)]
pub struct NodePath {
    /// Action indices to follow from the root, in order.
    pub actions: Vec<usize>,
}

impl NodePath {
    /// Creates a new, empty path (pointing at the root).
    pub fn new() -> Self {
        NodePath { actions: Vec::new() }
    }

    /// Extends the path with one more action index.
    pub fn push(&mut self, action: usize) {
        self.actions.push(action);
    }

    /// Number of steps from the root.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True iff the path points at the root itself.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "root")?;
        for a in &self.actions {
            write!(f, " -> {a}")?;
        }
        Ok(())
    }
}
