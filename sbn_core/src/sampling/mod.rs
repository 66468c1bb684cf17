//! Approximate inference over discrete Bayesian networks.
//!
//! The sampler does not know how a network is stored, it only needs a view of
//! the network (`DiscreteModel`) whose nodes fulfill the `DiscreteNode` contract:
//!
//! -   enumerate the states of the variable;
//! -   tell if the variable is fixed by the evidence;
//! -   tell if all the parents of the variable are assigned in a partial event;
//! -   give the conditional probability of a state given the parents' states.
//!
//! From those, ancestral sampling (for the initial event) and sampling from the
//! full conditional given the Markov blanket (for the Gibbs sweeps) are derived.

mod event;
mod gibbs;
mod posterior;

pub use self::event::{generate_random_event, Event, Evidence};
pub use self::gibbs::{Chain, Flow, Gibbs};
pub use self::posterior::Posterior;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use smallvec::SmallVec;

/// Position of a variable in the network.
pub type VarId = usize;

pub const MCMC_DEFAULT_SAMPLE_COUNT: usize = 2000;
pub const DEFAULT_BURN_IN: usize = 0;
pub const DEFAULT_THINNING: usize = 1;

/// States of the parents of a node, in the order the parents were declared.
pub type ParentStates = SmallVec<[usize; 8]>;

/// A read-only view of a network and the evidence currently set on it.
pub trait DiscreteModel {
    type Node: DiscreteNode;

    /// All the nodes of the network, a node's `position` is its index in this slice.
    fn nodes(&self) -> &[Self::Node];

    fn evidence(&self) -> &Evidence;

    fn var_id(&self, name: &str) -> Option<VarId>;

    /// Checks the network can be sampled. Called once before a query starts.
    fn validate(&self) -> Result<(), crate::NetError> {
        Ok(())
    }
}

pub trait DiscreteNode {
    fn name(&self) -> &str;

    fn position(&self) -> VarId;

    /// Possible states of the variable, never empty.
    fn states(&self) -> &[String];

    fn parents(&self) -> &[VarId];

    fn children(&self) -> &[VarId];

    /// P(self = state | parents = parent_states), where `parent_states` follows
    /// the order of `parents`.
    fn cond_prob(&self, state: usize, parent_states: &[usize]) -> f64;

    fn is_set_in_evidence(&self, evidence: &Evidence) -> bool {
        evidence.get(self.position()).is_some()
    }

    /// Returns true if all the parents of this variable are set in the event.
    fn can_be_evaluated(&self, event: &Event) -> bool {
        self.parents().iter().all(|p| event.is_set(*p))
    }

    /// Collects the current states of the parents, optionally replacing the value
    /// of one variable. Returns `None` if any parent is not set.
    fn parent_states(&self, event: &Event, subst: Option<(VarId, usize)>) -> Option<ParentStates> {
        self.parents()
            .iter()
            .map(|p| match subst {
                Some((var, state)) if var == *p => Some(state),
                _ => event.get(*p),
            })
            .collect()
    }

    /// Draws a state from the distribution of the variable given the states of
    /// its parents in a (possibly partial) event.
    fn sample_given_parents<R: Rng + ?Sized>(&self, event: &Event, rng: &mut R) -> usize {
        let parents = self.parent_states(event, None).unwrap_or_default();
        let weights = (0..self.states().len()).map(|s| self.cond_prob(s, &parents));
        draw_categorical(weights, self.states().len(), rng)
    }

    /// Draws a state from the distribution of the variable given the states of
    /// its Markov blanket (parents, children and children's other parents) in a
    /// complete event.
    fn sample_given_markov_blanket<M, R>(&self, net: &M, event: &Event, rng: &mut R) -> usize
    where
        M: DiscreteModel<Node = Self>,
        R: Rng + ?Sized,
        Self: Sized,
    {
        let pos = self.position();
        let parents = self.parent_states(event, None).unwrap_or_default();
        let nodes = net.nodes();
        let weights = (0..self.states().len()).map(|x| {
            let mut w = self.cond_prob(x, &parents);
            for child in self.children().iter().map(|c| &nodes[*c]) {
                if w == 0.0 {
                    break;
                }
                let child_state = match event.get(child.position()) {
                    Some(s) => s,
                    None => continue,
                };
                let child_parents = child
                    .parent_states(event, Some((pos, x)))
                    .unwrap_or_default();
                w *= child.cond_prob(child_state, &child_parents);
            }
            w
        });
        draw_categorical(weights, self.states().len(), rng)
    }
}

/// Draws an index proportionally to the weights. If no weight is positive
/// every category is equally likely.
pub(crate) fn draw_categorical<I, R>(weights: I, k: usize, rng: &mut R) -> usize
where
    I: IntoIterator<Item = f64>,
    R: Rng + ?Sized,
{
    match WeightedIndex::<f64>::new(weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..k),
    }
}
