use smallvec::SmallVec;

use super::cpt::Cpt;
use crate::sampling::{DiscreteNode, VarId};

/// A discrete random variable of a network.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    name: String,
    pos: VarId,
    states: Vec<String>,
    parents: SmallVec<[VarId; 4]>,
    children: SmallVec<[VarId; 4]>,
    table: Option<Cpt>,
}

impl Variable {
    pub(super) fn new(name: String, pos: VarId, states: Vec<String>) -> Variable {
        Variable {
            name,
            pos,
            states,
            parents: SmallVec::new(),
            children: SmallVec::new(),
            table: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Index of the state with the given name.
    pub fn state_index(&self, state: &str) -> Option<usize> {
        let state = super::normalize_name(state);
        self.states.iter().position(|s| *s == state)
    }

    pub fn parents(&self) -> &[VarId] {
        &self.parents
    }

    pub fn children(&self) -> &[VarId] {
        &self.children
    }

    pub fn table(&self) -> Option<&Cpt> {
        self.table.as_ref()
    }

    /// Adds a parent; any previous table no longer fits and is dropped.
    pub(super) fn add_parent(&mut self, parent: VarId) {
        self.parents.push(parent);
        self.table = None;
    }

    pub(super) fn add_child(&mut self, child: VarId) {
        self.children.push(child);
    }

    pub(super) fn set_table(&mut self, table: Cpt) {
        self.table = Some(table);
    }
}

impl DiscreteNode for Variable {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn position(&self) -> VarId {
        self.pos
    }

    #[inline]
    fn states(&self) -> &[String] {
        &self.states
    }

    #[inline]
    fn parents(&self) -> &[VarId] {
        &self.parents
    }

    #[inline]
    fn children(&self) -> &[VarId] {
        &self.children
    }

    fn cond_prob(&self, state: usize, parent_states: &[usize]) -> f64 {
        self.table
            .as_ref()
            .map(|t| t.prob(state, parent_states))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::test::sprinkler;
    use crate::sampling::{Event, Evidence};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn evaluable_once_parents_are_set() {
        let net = sprinkler();
        let wet = &net.variables()[net.var_id("wet_grass").unwrap()];
        let mut evidence = Evidence::new();
        evidence.insert(net.var_id("sprinkler").unwrap(), 0);
        let event = Event::from_evidence(4, &evidence);
        assert!(!wet.can_be_evaluated(&event));

        evidence.insert(net.var_id("rain").unwrap(), 1);
        let event = Event::from_evidence(4, &evidence);
        assert!(wet.can_be_evaluated(&event));
        assert!(!wet.is_set_in_evidence(&evidence));

        let cloudy = &net.variables()[net.var_id("cloudy").unwrap()];
        assert!(cloudy.can_be_evaluated(&Event::from_evidence(4, &Evidence::new())));
    }

    #[test]
    fn sample_given_parents_uses_the_parent_row() {
        let net = sprinkler();
        let wet = &net.variables()[net.var_id("wet_grass").unwrap()];
        let mut evidence = Evidence::new();
        // neither sprinkler nor rain: the grass is never wet
        evidence.insert(net.var_id("sprinkler").unwrap(), 1);
        evidence.insert(net.var_id("rain").unwrap(), 1);
        let event = Event::from_evidence(4, &evidence);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(wet.sample_given_parents(&event, &mut rng), 1);
        }
    }

    #[test]
    fn markov_blanket_conditional() {
        // P(cloudy | sprinkler = t, rain = t, wet_grass = t)
        //   ∝ P(c) P(s = t | c) P(r = t | c)
        // c = t: 0.5 * 0.1 * 0.8 = 0.04
        // c = f: 0.5 * 0.5 * 0.2 = 0.05
        let net = sprinkler();
        let cloudy = &net.variables()[net.var_id("cloudy").unwrap()];
        let mut evidence = Evidence::new();
        for var in &["cloudy", "sprinkler", "rain", "wet_grass"] {
            evidence.insert(net.var_id(var).unwrap(), 0);
        }
        let event = Event::from_evidence(4, &evidence);

        let mut rng = StdRng::seed_from_u64(21);
        let trials = 40_000;
        let hits = (0..trials)
            .filter(|_| cloudy.sample_given_markov_blanket(&net, &event, &mut rng) == 0)
            .count();
        let p = hits as f64 / trials as f64;
        assert!((p - 0.04 / 0.09).abs() < 0.015, "p = {}", p);
    }
}
