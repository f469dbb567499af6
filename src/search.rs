//! The search driver: orchestrates selection, expansion, evaluation and
//! backup into the iteration loop that grows a search tree.

use std::time::Instant;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ExpansionMode, SearchConfig};
use crate::environment::Environment;
use crate::policy::evaluation::ValueEstimator;
use crate::policy::expansion::ExpansionPolicy;
use crate::policy::selection::{Selection, SelectionPolicy};
use crate::stats::SearchStatistics;
use crate::tree::{Node, NodePath};
use crate::{PlanningError, Result};

/// Orchestrates the MCTS selection / expansion / evaluation / backup loop.
///
/// Owns the policies used to grow the tree and the RNG stream every
/// stochastic choice in the core draws from. A `Search` is reusable across
/// many calls to [`Search::search`] (e.g. once per decision in an episode
/// loop); each call grows a fresh tree rooted at the state passed in.
pub struct Search<E: Environment> {
    config: SearchConfig,
    selection_policy: Box<dyn SelectionPolicy<E>>,
    expansion_policy: Box<dyn ExpansionPolicy<E>>,
    value_estimator: Box<dyn ValueEstimator<E>>,
    rng: StdRng,
    statistics: SearchStatistics,
}

impl<E: Environment + 'static> Search<E> {
    /// Creates a new search driver with the given configuration and
    /// policies. The RNG is seeded from `config.seed`.
    pub fn new<S, X, V>(config: SearchConfig, selection: S, expansion: X, value_estimator: V) -> Self
    where
        S: SelectionPolicy<E> + 'static,
        X: ExpansionPolicy<E> + 'static,
        V: ValueEstimator<E> + 'static,
    {
        let rng = StdRng::seed_from_u64(config.seed);
        Search {
            config,
            selection_policy: Box::new(selection),
            expansion_policy: Box::new(expansion),
            value_estimator: Box::new(value_estimator),
            rng,
            statistics: SearchStatistics::new(),
        }
    }

    /// Replaces the selection policy.
    pub fn with_selection_policy<S: SelectionPolicy<E> + 'static>(mut self, policy: S) -> Self {
        self.selection_policy = Box::new(policy);
        self
    }

    /// Replaces the expansion policy.
    pub fn with_expansion_policy<X: ExpansionPolicy<E> + 'static>(mut self, policy: X) -> Self {
        self.expansion_policy = Box::new(policy);
        self
    }

    /// Replaces the value estimator.
    pub fn with_value_estimator<V: ValueEstimator<E> + 'static>(mut self, estimator: V) -> Self {
        self.value_estimator = Box::new(estimator);
        self
    }

    /// Returns statistics from the most recently completed `search()` call.
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Grows a fresh search tree rooted at the given state and returns it.
    ///
    /// `env` is deep-cloned once on entry; the caller's copy is never
    /// touched, so it can be reused immediately after this call returns
    /// (e.g. to call `search` again from the same state with a different
    /// budget, or to step the real episode forward).
    pub fn search(
        &mut self,
        env: &E,
        observation: Option<E::Observation>,
        incoming_reward: f32,
    ) -> Result<Node<E>> {
        let action_space_size = env.action_space_size();
        if action_space_size == 0 {
            return Err(PlanningError::InvalidActionSpace(
                "action space must have at least one action".into(),
            ));
        }

        self.statistics = SearchStatistics::new();
        let start_time = Instant::now();

        let mut root = Node::new_root(env.clone(), observation, incoming_reward, action_space_size);
        debug!("search: built root with action_space_size={action_space_size}");

        let (root_value, root_prior) = self.value_estimator.evaluate_with_prior(&root, &mut self.rng)?;
        root.value_evaluation = root_value;
        root.prior = root_prior;
        backup(&mut root, &[], root_value, self.config.discount_factor)?;

        loop {
            if root.visits >= self.config.budget {
                break;
            }
            if let Some(max_time) = self.config.max_time {
                if start_time.elapsed() >= max_time {
                    self.statistics.stopped_early = true;
                    info!(
                        "search: stopped early after {} iterations (time budget exhausted)",
                        self.statistics.iterations
                    );
                    break;
                }
            }

            self.iterate(&mut root)?;
            self.statistics.iterations += 1;
        }

        self.statistics.total_time = start_time.elapsed();
        self.statistics.tree_size = count_nodes(&root);
        Ok(root)
    }

    /// Runs one selection → expansion → evaluation → backup cycle.
    fn iterate(&mut self, root: &mut Node<E>) -> Result<()> {
        let path = self.select(root)?;
        self.statistics.max_depth = self.statistics.max_depth.max(path.len());

        let leaf = node_at_mut(root, &path.actions)?;
        if leaf.terminal {
            leaf.value_evaluation = 0.0;
            trace!("iterate: re-visited terminal leaf at {path}");
            backup(root, &path.actions, 0.0, self.config.discount_factor)?;
            return Ok(());
        }

        match self.config.expansion_mode {
            ExpansionMode::SingleChild => {
                let action = self.expansion_policy.select_action(leaf, &mut self.rng)?;
                self.expand_one(root, &path, action)?;
            }
            ExpansionMode::AllChildren => {
                let actions = leaf.unexpanded_actions();
                for action in actions {
                    self.expand_one(root, &path, action)?;
                }
            }
        }

        Ok(())
    }

    /// Descends from `root` using the selection policy until it signals
    /// expansion or a terminal node is reached.
    ///
    /// Fails with [`PlanningError::UnexpandedAction`] if a selection policy
    /// violates its contract by descending into an action it has not
    /// expanded.
    fn select(&self, root: &Node<E>) -> Result<NodePath> {
        let mut path = NodePath::new();
        let mut current = root;

        loop {
            if current.terminal {
                break;
            }
            match self.selection_policy.select(current) {
                Selection::ExpandHere => break,
                Selection::Descend(action) => {
                    path.push(action);
                    current = current.step(action)?;
                }
            }
        }

        Ok(path)
    }

    /// Expands `action` at the node reached by `path`, evaluates the new
    /// child, and backs up its value.
    fn expand_one(&mut self, root: &mut Node<E>, path: &NodePath, action: usize) -> Result<()> {
        let leaf = node_at_mut(root, &path.actions)?;
        let remaining = leaf.unexpanded_actions().len();
        if remaining == 0 {
            return Err(PlanningError::InvariantViolation(
                "expand_one called on a fully expanded node".into(),
            ));
        }

        let env = if remaining == 1 {
            leaf.take_env_snapshot()
        } else {
            leaf.env_snapshot().cloned()
        };
        let mut env = env.ok_or_else(|| {
            PlanningError::CloneFailed("expansion requires a cloneable environment snapshot".into())
        })?;

        let outcome = env.step(action);
        let terminal = outcome.done();
        let observation = if outcome.terminated { None } else { outcome.observation };
        let env_snapshot = if terminal { None } else { Some(env) };

        let mut child = Node::new_child(
            env_snapshot,
            observation,
            outcome.reward,
            terminal,
            leaf.action_space_size(),
        );

        let (value, prior) = self.value_estimator.evaluate_with_prior(&child, &mut self.rng)?;
        child.value_evaluation = value;
        child.prior = prior;

        leaf.insert_child(action, child)?;
        debug!("expand_one: created child for action {action} at {path} (terminal={terminal})");

        let mut child_path = path.clone();
        child_path.push(action);
        backup(root, &child_path.actions, value, self.config.discount_factor)
    }
}

/// Walks from `root` to the node reached by `path`, returning a mutable
/// reference to it.
fn node_at_mut<'a, E: Environment>(root: &'a mut Node<E>, path: &[usize]) -> Result<&'a mut Node<E>> {
    let mut node = root;
    for &action in path {
        node = node.step_mut(action)?;
    }
    Ok(node)
}

/// Propagates `leaf_value` from the node reached by `path` back to the
/// root, applying the discount/reward recurrence at every node along the
/// way: `g = γ·g + n.reward; n.subtree_sum += g; n.visits += 1`.
///
/// Implemented as a recursion that descends to the target first and
/// applies the update on the way back out, which visits nodes in the
/// target-to-root order the recurrence requires without needing parent
/// back-pointers.
fn backup<E: Environment>(root: &mut Node<E>, path: &[usize], leaf_value: f32, discount: f64) -> Result<()> {
    fn go<E: Environment>(node: &mut Node<E>, path: &[usize], g: &mut f64, discount: f64) -> Result<()> {
        if let Some((&action, rest)) = path.split_first() {
            let child = node.step_mut(action)?;
            go(child, rest, g, discount)?;
        }
        *g = discount * *g + node.reward as f64;
        node.subtree_sum += *g;
        node.visits += 1;
        Ok(())
    }

    let mut g = leaf_value as f64;
    go(root, path, &mut g, discount)
}

fn count_nodes<E: Environment>(node: &Node<E>) -> usize {
    1 + node.children().map(|(_, c)| count_nodes(c)).sum::<usize>()
}
