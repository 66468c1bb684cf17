//! Discrete Bayesian network representation.
//!
//! A `Net` owns its variables, their conditional probability tables and the
//! evidence currently set. Variables and states are looked up by name; names
//! are normalized first (see `normalize_name`) so "Wet Grass" and "wet_grass"
//! refer to the same variable.

mod cpt;
mod variable;


use std::collections::HashMap;
use std::str::FromStr;

pub use self::cpt::Cpt;
pub use self::variable::Variable;

use crate::sampling::{DiscreteModel, DiscreteNode, Evidence, Gibbs, Posterior, VarId};
use crate::{NetError, ParseErr, QueryErr};

/// A discrete Bayesian network plus the evidence set on it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Net {
    name: String,
    variables: Vec<Variable>,
    index: HashMap<String, VarId>,
    evidence: Evidence,
}

impl Default for Net {
    fn default() -> Net {
        let id = uuid::Uuid::new_v4();
        Net::new(&id.to_string())
    }
}

impl Net {
    /// Creates an empty network. The name is normalized like variable names,
    /// characters that cannot appear in a description are replaced by `_`.
    pub fn new(name: &str) -> Net {
        Net {
            name: network_name(name),
            variables: Vec::new(),
            index: HashMap::new(),
            evidence: Evidence::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = network_name(name);
    }

    /// Declares a new variable with the given states, returns its position.
    pub fn add_variable<S: AsRef<str>>(
        &mut self,
        name: &str,
        states: &[S],
    ) -> Result<VarId, NetError> {
        let name = normalize_name(name);
        if !is_valid_name(&name) {
            return Err(NetError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(NetError::DuplicateVariable(name));
        }
        if states.is_empty() {
            return Err(NetError::NoStates(name));
        }
        let mut normalized: Vec<String> = Vec::with_capacity(states.len());
        for state in states {
            let state = normalize_name(state.as_ref());
            if !is_valid_name(&state) {
                return Err(NetError::InvalidName(state));
            }
            if normalized.contains(&state) {
                return Err(NetError::DuplicateState { var: name, state });
            }
            normalized.push(state);
        }

        let pos = self.variables.len();
        self.variables
            .push(Variable::new(name.clone(), pos, normalized));
        self.index.insert(name, pos);
        Ok(pos)
    }

    /// Connects `parent -> child`. The child's probability table is reset and has
    /// to be set again to account for the new parent.
    ///
    /// Cycles are not rejected here, a cyclic network fails when queried.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<(), NetError> {
        let parent_id = self.lookup(parent)?;
        let child_id = self.lookup(child)?;
        if parent_id == child_id {
            return Err(NetError::SelfParent(self.variables[child_id].name().to_owned()));
        }
        if self.variables[child_id].parents().contains(&parent_id) {
            return Ok(());
        }
        self.variables[child_id].add_parent(parent_id);
        self.variables[parent_id].add_child(child_id);
        Ok(())
    }

    /// Sets the conditional probability table of a variable, see `Cpt` for
    /// the expected layout.
    pub fn set_probabilities(&mut self, var: &str, probs: Vec<f64>) -> Result<(), NetError> {
        let id = self.lookup(var)?;
        let variable = &self.variables[id];
        let parent_cards: Vec<usize> = variable
            .parents()
            .iter()
            .map(|p| self.variables[*p].states().len())
            .collect();
        let table = Cpt::new(
            variable.name(),
            variable.states().len(),
            &parent_cards,
            probs,
        )?;
        self.variables[id].set_table(table);
        Ok(())
    }

    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.index.get(&normalize_name(name)).copied()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.var_id(name).map(|id| &self.variables[id])
    }

    /// All the variables, in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Fixes the state of a variable for the following queries.
    pub fn add_evidence(&mut self, var: &str, state: &str) -> Result<(), QueryErr> {
        let id = self
            .var_id(var)
            .ok_or_else(|| QueryErr::UnknownVariable(var.to_owned()))?;
        let state_id = self.variables[id]
            .state_index(state)
            .ok_or_else(|| QueryErr::UnknownState {
                var: self.variables[id].name().to_owned(),
                state: state.to_owned(),
            })?;
        self.evidence.insert(id, state_id);
        Ok(())
    }

    /// Replaces the current evidence. On error the previous evidence is kept.
    pub fn set_evidence<'a, I>(&mut self, evidence: I) -> Result<(), QueryErr>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let previous = std::mem::take(&mut self.evidence);
        for (var, state) in evidence {
            if let Err(err) = self.add_evidence(var, state) {
                self.evidence = previous;
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn remove_evidence(&mut self, var: &str) -> Option<String> {
        let id = self.var_id(var)?;
        self.evidence
            .remove(id)
            .map(|state| self.variables[id].states()[state].clone())
    }

    pub fn clear_evidence(&mut self) {
        self.evidence.clear()
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// The evidence as (variable, state) names.
    pub fn evidence_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.evidence.iter().map(move |(var, state)| {
            let var = &self.variables[var];
            (var.name(), var.states()[state].as_str())
        })
    }

    /// Returns the estimated probability of each state of `var` given the
    /// current evidence, using `sample_count` samples of a Gibbs sampler.
    /// `progress` receives the completion fraction, in [0, 1).
    pub fn query_variable<F>(
        &self,
        var: &str,
        sample_count: usize,
        progress: F,
    ) -> Result<Posterior, QueryErr>
    where
        F: FnMut(f64),
    {
        Gibbs::new(Some(sample_count), None).query(self, var, progress)
    }

    /// Same as `query_variable` with a preconfigured sampler.
    pub fn query_with<F>(&self, sampler: &Gibbs, var: &str, progress: F) -> Result<Posterior, QueryErr>
    where
        F: FnMut(f64),
    {
        sampler.query(self, var, progress)
    }

    /// Checks the network is consistent (variable ids, edges, evidence and the
    /// name index agree with each other) and that every variable has a
    /// probability table that matches its parents.
    pub fn validate(&self) -> Result<(), NetError> {
        self.validate_structure()?;
        for var in &self.variables {
            let table = var
                .table()
                .ok_or_else(|| NetError::MissingTable(var.name().to_owned()))?;
            let parent_cards: Vec<usize> = var
                .parents()
                .iter()
                .map(|p| self.variables[*p].states().len())
                .collect();
            if !table.fits(var.states().len(), &parent_cards) {
                let rows: usize = parent_cards.iter().product();
                return Err(NetError::TableShape {
                    var: var.name().to_owned(),
                    expected: rows * var.states().len(),
                    got: table.as_slice().len(),
                });
            }
        }
        Ok(())
    }

    fn validate_structure(&self) -> Result<(), NetError> {
        let len = self.variables.len();
        let inconsistent = |msg: String| Err(NetError::Inconsistent(msg));
        if self.index.len() != len {
            return inconsistent(format!(
                "{} indexed names for {} variables",
                self.index.len(),
                len
            ));
        }
        for (name, id) in &self.index {
            match self.variables.get(*id) {
                Some(var) if var.name() == name => {}
                _ => return inconsistent(format!("name `{}` points to variable #{}", name, id)),
            }
        }
        for (i, var) in self.variables.iter().enumerate() {
            if var.position() != i {
                return inconsistent(format!(
                    "`{}` is stored at #{} but claims #{}",
                    var.name(),
                    i,
                    var.position()
                ));
            }
            if var.states().is_empty() {
                return Err(NetError::NoStates(var.name().to_owned()));
            }
            for p in var.parents() {
                let mirrored = self
                    .variables
                    .get(*p)
                    .map(|parent| parent.children().contains(&i))
                    .unwrap_or(false);
                if !mirrored {
                    return inconsistent(format!("`{}` has a dangling parent #{}", var.name(), p));
                }
            }
            for c in var.children() {
                let mirrored = self
                    .variables
                    .get(*c)
                    .map(|child| child.parents().contains(&i))
                    .unwrap_or(false);
                if !mirrored {
                    return inconsistent(format!("`{}` has a dangling child #{}", var.name(), c));
                }
            }
        }
        for (var, state) in self.evidence.iter() {
            let in_range = self
                .variables
                .get(var)
                .map(|v| state < v.states().len())
                .unwrap_or(false);
            if !in_range {
                return inconsistent(format!("evidence sets variable #{} to state #{}", var, state));
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<VarId, NetError> {
        self.var_id(name)
            .ok_or_else(|| NetError::UnknownVariable(normalize_name(name)))
    }
}

impl DiscreteModel for Net {
    type Node = Variable;

    fn nodes(&self) -> &[Variable] {
        &self.variables
    }

    fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    fn var_id(&self, name: &str) -> Option<VarId> {
        Net::var_id(self, name)
    }

    fn validate(&self) -> Result<(), NetError> {
        Net::validate(self)
    }
}

impl FromStr for Net {
    type Err = ParseErr;

    fn from_str(source: &str) -> Result<Net, ParseErr> {
        crate::lang::parse_net(source)
    }
}

fn network_name(name: &str) -> String {
    let name: String = normalize_name(name)
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    if name.is_empty() {
        "unnamed".to_owned()
    } else {
        name
    }
}

/// Characters allowed in variable, state and network names.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_name_char)
}

/// Normalizes a variable or state name: surrounding whitespace is trimmed,
/// letters are lower-cased and runs of whitespace or `-` become a single `_`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut sep = false;
    for c in name.trim().chars() {
        if c.is_whitespace() || c == '-' {
            sep = true;
            continue;
        }
        if sep {
            normalized.push('_');
            sep = false;
        }
        normalized.extend(c.to_lowercase());
    }
    normalized
}
