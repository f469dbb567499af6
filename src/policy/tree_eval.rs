//! Tree-evaluation policies: turn a searched root's children statistics
//! into an action distribution for the outer episode loop to draw from.

use crate::environment::Environment;
use crate::policy::value_transform::{IdentityTransform, ValueTransform};
use crate::tree::Node;
use crate::utils::{argmax_set, proportional, softmax};

/// A probability distribution over a node's `[0, A)` action space,
/// optionally augmented with an extra "terminate search, use this node's
/// own estimate" mass for recursive tree evaluators.
#[derive(Debug, Clone)]
pub struct ActionDistribution {
    /// Probability of each action index, length `A`. Unexpanded actions
    /// always carry probability 0.
    pub probs: Vec<f64>,
    /// Relative mass assigned to "stop here" rather than any action, when
    /// the include-self option was requested.
    pub self_prob: Option<f64>,
}

impl ActionDistribution {
    /// Draws a sample: `Some(action)` for an action, or `None` meaning the
    /// "self" slot was drawn (only possible when `self_prob` is `Some`).
    pub fn sample_action(&self, rng: &mut impl rand::Rng) -> Option<usize> {
        let total: f64 = self.probs.iter().sum::<f64>() + self.self_prob.unwrap_or(0.0);
        if total <= 0.0 {
            return None;
        }
        let mut r: f64 = rng.gen::<f64>() * total;
        for (action, p) in self.probs.iter().enumerate() {
            if r < *p {
                return Some(action);
            }
            r -= p;
        }
        None
    }

    /// The action with the highest probability, breaking ties by lowest
    /// index. `None` if every action has probability 0 (e.g. a root with
    /// no expanded children at all).
    pub fn argmax_action(&self) -> Option<usize> {
        let best = argmax_set(&self.probs);
        if self.probs.iter().all(|p| *p <= 0.0) {
            return None;
        }
        best.into_iter().next()
    }
}

/// Trait for policies that turn a searched root into an [`ActionDistribution`].
pub trait TreeEvaluationPolicy<E: Environment>: Send + Sync {
    /// Computes the distribution over `root`'s action space.
    fn distribution(&self, root: &Node<E>) -> ActionDistribution;

    /// Create a boxed clone of this policy.
    fn clone_box(&self) -> Box<dyn TreeEvaluationPolicy<E>>;
}

/// Probability proportional to visit count. Unexpanded actions carry
/// probability 0. The most common choice — robust because it reflects how
/// much search attention an action actually received, not just its
/// (possibly noisy) value estimate.
#[derive(Debug, Clone, Default)]
pub struct VisitCountPolicy;

impl VisitCountPolicy {
    /// Creates a new visit-count tree-evaluation policy.
    pub fn new() -> Self {
        VisitCountPolicy
    }
}

impl<E: Environment> TreeEvaluationPolicy<E> for VisitCountPolicy {
    fn distribution(&self, root: &Node<E>) -> ActionDistribution {
        let mut scores = vec![0.0; root.action_space_size()];
        for (action, child) in root.children() {
            scores[action] = child.visits as f64;
        }
        ActionDistribution {
            probs: proportional_or_zero(&scores),
            self_prob: None,
        }
    }

    fn clone_box(&self) -> Box<dyn TreeEvaluationPolicy<E>> {
        Box::new(self.clone())
    }
}

/// Probability proportional to `exp(τ(Q(a)) / T)` (standard softmax), with
/// `T = None` meaning raw-score-proportional and `T = 0` meaning uniform
/// argmax tie-break. Optionally augments the distribution with a "stop
/// here" self slot for recursive tree evaluators, following the original
/// predictor-guided evaluator this is grounded on.
pub struct QSoftmaxPolicy {
    /// `None` ⇒ proportional to raw (non-negative) scores; `Some(0.0)` ⇒
    /// uniform argmax; `Some(t)` for `t > 0` ⇒ softmax with temperature `t`.
    pub temperature: Option<f64>,
    /// Include the "terminate search, use this node's own estimate" slot.
    pub include_self: bool,
    value_transform: Box<dyn ValueTransform>,
}

impl QSoftmaxPolicy {
    /// Creates a Q-value softmax policy with the identity value transform
    /// and no self slot.
    pub fn new(temperature: Option<f64>) -> Self {
        QSoftmaxPolicy {
            temperature,
            include_self: false,
            value_transform: Box::new(IdentityTransform::new()),
        }
    }

    /// Enables the include-self slot.
    pub fn with_include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    /// Uses a custom value transform on `Q(a)` before it enters the score.
    pub fn with_transform(mut self, value_transform: Box<dyn ValueTransform>) -> Self {
        self.value_transform = value_transform;
        self
    }
}

impl<E: Environment> TreeEvaluationPolicy<E> for QSoftmaxPolicy {
    fn distribution(&self, root: &Node<E>) -> ActionDistribution {
        let action_space = root.action_space_size();
        let expanded: Vec<(usize, f64)> = root
            .children()
            .map(|(a, c)| (a, self.value_transform.apply(c.default_value())))
            .collect();

        if expanded.is_empty() {
            return ActionDistribution {
                probs: vec![0.0; action_space],
                self_prob: self.include_self.then_some(1.0),
            };
        }

        let raw_scores: Vec<f64> = expanded.iter().map(|(_, s)| *s).collect();
        let child_probs = match self.temperature {
            None => proportional(&raw_scores),
            Some(t) if t == 0.0 => {
                let winners = argmax_set(&raw_scores);
                let share = 1.0 / winners.len() as f64;
                let mut p = vec![0.0; raw_scores.len()];
                for w in winners {
                    p[w] = share;
                }
                p
            }
            Some(t) => softmax(&raw_scores, t),
        };

        let mut probs = vec![0.0; action_space];
        for ((action, _), p) in expanded.iter().zip(child_probs.iter()) {
            probs[*action] = *p;
        }

        // `probs` here is already normalized to sum to 1 for each temperature
        // branch above. Folding in a "stop here" slot with relative mass
        // `(Σ basis) / (visits - 1)` against that same basis and renormalizing
        // jointly reduces, for every branch, to the closed form below: the
        // self slot always ends up with exactly `1 / visits`, and each action
        // keeps its already-normalized share scaled down by `(visits - 1) /
        // visits`. This degenerates correctly at `visits == 1` (scale 0, all
        // mass on self) without a separate branch.
        let self_prob = self.include_self.then(|| {
            if root.visits <= 1 {
                1.0
            } else {
                1.0 / root.visits as f64
            }
        });

        if let Some(sp) = self_prob {
            let scale = 1.0 - sp;
            for p in probs.iter_mut() {
                *p *= scale;
            }
            return ActionDistribution { probs, self_prob: Some(sp) };
        }

        ActionDistribution { probs, self_prob }
    }

    fn clone_box(&self) -> Box<dyn TreeEvaluationPolicy<E>> {
        Box::new(QSoftmaxPolicy {
            temperature: self.temperature,
            include_self: self.include_self,
            value_transform: self.value_transform.clone_box(),
        })
    }
}

fn proportional_or_zero(scores: &[f64]) -> Vec<f64> {
    if scores.iter().all(|s| *s == 0.0) {
        vec![0.0; scores.len()]
    } else {
        proportional(scores)
    }
}

impl<E: Environment> TreeEvaluationPolicy<E> for Box<dyn TreeEvaluationPolicy<E>> {
    fn distribution(&self, root: &Node<E>) -> ActionDistribution {
        (**self).distribution(root)
    }

    fn clone_box(&self) -> Box<dyn TreeEvaluationPolicy<E>> {
        (**self).clone_box()
    }
}
