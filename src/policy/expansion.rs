//! Expansion policies: choose which unexpanded action(s) the driver
//! materializes once the selection phase signals [`crate::policy::selection::Selection::ExpandHere`].

use crate::environment::Environment;
use crate::tree::Node;

/// Trait for policies that pick which action to expand next at a leaf that
/// is not fully expanded.
///
/// Paired with [`crate::config::ExpansionMode::SingleChild`]; under
/// [`crate::config::ExpansionMode::AllChildren`] the driver ignores this
/// policy and expands every unexpanded action directly.
pub trait ExpansionPolicy<E: Environment>: Send + Sync {
    /// Chooses one unexpanded action index to expand at `node`.
    fn select_action(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> crate::Result<usize>;

    /// Create a boxed clone of this policy.
    fn clone_box(&self) -> Box<dyn ExpansionPolicy<E>>;
}

/// Expands a uniformly random unexpanded action.
#[derive(Debug, Clone, Default)]
pub struct DefaultExpansion;

impl DefaultExpansion {
    /// Creates a new default (uniform random) expansion policy.
    pub fn new() -> Self {
        DefaultExpansion
    }
}

impl<E: Environment> ExpansionPolicy<E> for DefaultExpansion {
    fn select_action(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> crate::Result<usize> {
        node.sample_unexplored_action(rng)
    }

    fn clone_box(&self) -> Box<dyn ExpansionPolicy<E>> {
        Box::new(self.clone())
    }
}

impl<E: Environment> ExpansionPolicy<E> for Box<dyn ExpansionPolicy<E>> {
    fn select_action(&self, node: &Node<E>, rng: &mut dyn rand::RngCore) -> crate::Result<usize> {
        (**self).select_action(node, rng)
    }

    fn clone_box(&self) -> Box<dyn ExpansionPolicy<E>> {
        (**self).clone_box()
    }
}
