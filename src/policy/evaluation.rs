//! Value estimators: produce a scalar estimate of expected discounted
//! future return at a freshly expanded (or freshly created root) node.

use rand::Rng;

use crate::environment::{Environment, Predictor};
use crate::tree::Node;
use crate::Result;

/// Trait for policies that estimate the value of a node at the moment it
/// is first evaluated.
///
/// Implementations may also populate `node.prior` (learned estimators do;
/// rollout/zero estimators leave it `None`).
pub trait ValueEstimator<E: Environment>: Send + Sync {
    /// Produces a value estimate for `node`. Must not mutate
    /// `node.value_evaluation` or `node.prior` itself — the driver assigns
    /// the returned value to `value_evaluation`.
    fn evaluate(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> Result<f32>;

    /// Returns the prior this estimator would assign for `node`, if any.
    fn prior_for(&self, _node: &Node<E>) -> Option<Vec<f32>> {
        None
    }

    /// Produces the `(value, prior)` pair the driver actually needs for a
    /// node. The default forwards to `evaluate` then `prior_for`, but an
    /// estimator backed by a single external call (e.g. one forward pass of
    /// a network that returns both a value head and a policy head) should
    /// override this instead, so the driver never pays for that call twice.
    fn evaluate_with_prior(
        &self,
        node: &Node<E>,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(f32, Option<Vec<f32>>)> {
        let value = self.evaluate(node, rng)?;
        let prior = self.prior_for(node);
        Ok((value, prior))
    }

    /// Create a boxed clone of this estimator.
    fn clone_box(&self) -> Box<dyn ValueEstimator<E>>;
}

/// Always returns 0. Useful when rewards alone carry enough signal and the
/// backup's own reward-accumulation does all the work.
#[derive(Debug, Clone, Default)]
pub struct ZeroEstimator;

impl ZeroEstimator {
    /// Creates a new zero estimator.
    pub fn new() -> Self {
        ZeroEstimator
    }
}

impl<E: Environment> ValueEstimator<E> for ZeroEstimator {
    fn evaluate(&self, _node: &Node<E>, _rng: &mut dyn rand::RngCore) -> Result<f32> {
        Ok(0.0)
    }

    fn clone_box(&self) -> Box<dyn ValueEstimator<E>> {
        Box::new(self.clone())
    }
}

/// Estimates value by simulating uniformly random actions from the node's
/// saved environment snapshot for up to `rollout_budget` steps, summing
/// (undiscounted) reward. Stops on termination or truncation. Requires the
/// node to still hold a cloneable environment snapshot.
#[derive(Debug, Clone)]
pub struct RandomRolloutEstimator {
    rollout_budget: usize,
}

impl RandomRolloutEstimator {
    /// Creates a new estimator with the given per-call step budget.
    pub fn new(rollout_budget: usize) -> Self {
        RandomRolloutEstimator { rollout_budget }
    }
}

impl<E: Environment> ValueEstimator<E> for RandomRolloutEstimator {
    fn evaluate(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> Result<f32> {
        if node.terminal {
            return Ok(0.0);
        }

        let Some(env) = node.env_snapshot() else {
            return Err(crate::PlanningError::CloneFailed(
                "random rollout requires a cloneable environment snapshot".into(),
            ));
        };

        let mut env = env.clone();
        let action_space = env.action_space_size();
        let mut accumulated = 0.0f32;

        for _ in 0..self.rollout_budget {
            let action = rng.gen_range(0..action_space);
            let outcome = env.step(action);
            accumulated += outcome.reward;
            if outcome.done() {
                break;
            }
        }

        Ok(accumulated)
    }

    fn clone_box(&self) -> Box<dyn ValueEstimator<E>> {
        Box::new(self.clone())
    }
}

/// Calls an external [`Predictor`] on the node's observation, returning its
/// scalar value and storing its action prior for PUCT-style selection.
///
/// No environment clone is required for evaluation; a clone is still
/// required if the node is later expanded.
pub struct PredictorEstimator<P> {
    predictor: P,
}

impl<P> PredictorEstimator<P> {
    /// Wraps `predictor` as a value estimator.
    pub fn new(predictor: P) -> Self {
        PredictorEstimator { predictor }
    }
}

impl<E, P> ValueEstimator<E> for PredictorEstimator<P>
where
    E: Environment,
    P: Predictor<E::Observation> + Clone + Send + Sync + 'static,
{
    fn evaluate(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> Result<f32> {
        Ok(self.evaluate_with_prior(node, rng)?.0)
    }

    fn prior_for(&self, node: &Node<E>) -> Option<Vec<f32>> {
        if node.terminal {
            return None;
        }
        let observation = node.observation.as_ref()?;
        let (_value, prior) = self.predictor.evaluate(observation);
        Some(prior)
    }

    fn evaluate_with_prior(
        &self,
        node: &Node<E>,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(f32, Option<Vec<f32>>)> {
        if node.terminal {
            return Ok((0.0, None));
        }

        let observation = node.observation.as_ref().ok_or_else(|| {
            crate::PlanningError::PredictorFailed(
                "non-terminal node has no observation to evaluate".into(),
            )
        })?;

        let (value, prior) = self.predictor.evaluate(observation);
        Ok((value, Some(prior)))
    }

    fn clone_box(&self) -> Box<dyn ValueEstimator<E>> {
        Box::new(PredictorEstimator {
            predictor: self.predictor.clone(),
        })
    }
}

impl<E: Environment> ValueEstimator<E> for Box<dyn ValueEstimator<E>> {
    fn evaluate(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> Result<f32> {
        (**self).evaluate(node, rng)
    }

    fn prior_for(&self, node: &Node<E>) -> Option<Vec<f32>> {
        (**self).prior_for(node)
    }

    fn evaluate_with_prior(
        &self,
        node: &Node<E>,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(f32, Option<Vec<f32>>)> {
        (**self).evaluate_with_prior(node, rng)
    }

    fn clone_box(&self) -> Box<dyn ValueEstimator<E>> {
        (**self).clone_box()
    }
}
