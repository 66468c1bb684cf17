use std::collections::BTreeMap;

use rand::Rng;

use super::{DiscreteModel, DiscreteNode, VarId};
use crate::NetError;

/// Observed values, a variable fixed to a single state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Evidence {
    fixed: BTreeMap<VarId, usize>,
}

impl Evidence {
    pub fn new() -> Evidence {
        Evidence::default()
    }

    /// Fixes `var` to `state`, returns the previous observation if any.
    pub fn insert(&mut self, var: VarId, state: usize) -> Option<usize> {
        self.fixed.insert(var, state)
    }

    pub fn remove(&mut self, var: VarId) -> Option<usize> {
        self.fixed.remove(&var)
    }

    #[inline]
    pub fn get(&self, var: VarId) -> Option<usize> {
        self.fixed.get(&var).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, usize)> + '_ {
        self.fixed.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.fixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty()
    }

    pub fn clear(&mut self) {
        self.fixed.clear()
    }
}

/// An assignment of states to the variables of a network.
///
/// While being generated an event is partial, after that every variable
/// has exactly one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    values: Vec<Option<usize>>,
}

impl Event {
    /// An event for `var_num` variables where only the evidence is set.
    /// The evidence is copied, later changes to the event never reach it.
    pub fn from_evidence(var_num: usize, evidence: &Evidence) -> Event {
        let mut values = vec![None; var_num];
        for (var, state) in evidence.iter() {
            if let Some(slot) = values.get_mut(var) {
                *slot = Some(state);
            }
        }
        Event { values }
    }

    #[inline]
    pub fn get(&self, var: VarId) -> Option<usize> {
        self.values.get(var).copied().flatten()
    }

    #[inline]
    pub fn is_set(&self, var: VarId) -> bool {
        self.get(var).is_some()
    }

    #[inline]
    pub(crate) fn set(&mut self, var: VarId, state: usize) {
        self.values[var] = Some(state);
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, Option<usize>)> + '_ {
        self.values.iter().copied().enumerate()
    }
}

/// Returns an event in which the variables not fixed by the evidence are set to
/// random states, drawn in ancestral order, whose frequencies (after repeated calls)
/// are consistent with the joint distribution of the network.
///
/// Fails if the evidence refers to a missing variable or state, or if some
/// variable never becomes evaluable, which means the network has a cycle or a
/// dependency on a variable that cannot be set.
pub fn generate_random_event<M, R>(net: &M, rng: &mut R) -> Result<Event, NetError>
where
    M: DiscreteModel,
    R: Rng + ?Sized,
{
    let nodes = net.nodes();
    let evidence = net.evidence();
    for (var, state) in evidence.iter() {
        let in_range = nodes
            .get(var)
            .map(|n| state < n.states().len())
            .unwrap_or(false);
        if !in_range {
            return Err(NetError::Inconsistent(format!(
                "evidence sets variable #{} to state #{}",
                var, state
            )));
        }
    }
    let mut event = Event::from_evidence(nodes.len(), evidence);
    let mut unset: Vec<&M::Node> = nodes
        .iter()
        .filter(|n| !n.is_set_in_evidence(evidence))
        .collect();

    // every productive scan sets at least one variable
    let max_scans = nodes.len() + 1;
    let mut scans = 0;
    while !unset.is_empty() {
        scans += 1;
        let settable: Vec<VarId> = unset
            .iter()
            .filter(|n| n.can_be_evaluated(&event))
            .map(|n| n.position())
            .collect();
        if settable.is_empty() || scans > max_scans {
            let stuck = unset.iter().map(|n| n.name().to_owned()).collect();
            return Err(NetError::Unevaluable(stuck));
        }
        for pos in settable {
            let state = nodes[pos].sample_given_parents(&event, rng);
            log::trace!("initial event: {} = {}", nodes[pos].name(), nodes[pos].states()[state]);
            event.set(pos, state);
        }
        unset.retain(|n| !event.is_set(n.position()));
    }
    Ok(event)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::test::sprinkler;
    use crate::Net;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn event_is_complete_and_keeps_evidence() {
        let mut net = sprinkler();
        net.add_evidence("wet_grass", "true").unwrap();
        net.add_evidence("cloudy", "false").unwrap();
        let wet = net.var_id("wet_grass").unwrap();
        let cloudy = net.var_id("cloudy").unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let event = generate_random_event(&net, &mut rng).unwrap();
            assert!(event.is_complete());
            assert_eq!(event.len(), 4);
            assert_eq!(event.get(wet), Some(0));
            assert_eq!(event.get(cloudy), Some(1));
        }
    }

    #[test]
    fn evidence_is_copied() {
        let mut evidence = Evidence::new();
        evidence.insert(1, 2);
        let mut event = Event::from_evidence(3, &evidence);
        event.set(1, 0);
        assert_eq!(evidence.get(1), Some(2));
        assert_eq!(event.get(1), Some(0));
        assert!(!event.is_set(0));
        assert!(!event.is_complete());
    }

    #[test]
    fn deterministic_parents_are_respected() {
        let mut net = Net::new("chain");
        net.add_variable("a", &["x", "y"]).unwrap();
        net.add_variable("b", &["x", "y"]).unwrap();
        net.add_edge("a", "b").unwrap();
        net.set_probabilities("a", vec![0.5, 0.5]).unwrap();
        // b copies a
        net.set_probabilities("b", vec![1.0, 0.0, 0.0, 1.0]).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let event = generate_random_event(&net, &mut rng).unwrap();
            assert_eq!(event.get(0), event.get(1));
        }
    }

    #[test]
    fn cyclic_network_is_unevaluable() {
        let mut net = Net::new("cycle");
        net.add_variable("root", &["t", "f"]).unwrap();
        net.add_variable("a", &["t", "f"]).unwrap();
        net.add_variable("b", &["t", "f"]).unwrap();
        net.add_edge("a", "b").unwrap();
        net.add_edge("b", "a").unwrap();
        net.set_probabilities("root", vec![0.5, 0.5]).unwrap();
        net.set_probabilities("a", vec![0.5, 0.5, 0.5, 0.5]).unwrap();
        net.set_probabilities("b", vec![0.5, 0.5, 0.5, 0.5]).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_random_event(&net, &mut rng).unwrap_err();
        assert_eq!(err, NetError::Unevaluable(vec!["a".into(), "b".into()]));

        // fixing one of the members breaks the cycle
        net.add_evidence("a", "t").unwrap();
        let event = generate_random_event(&net, &mut rng).unwrap();
        assert!(event.is_complete());
    }
}
