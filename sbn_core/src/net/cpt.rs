use float_cmp::approx_eq;
use smallvec::SmallVec;

use crate::NetError;

const ROW_SUM_EPSILON: f64 = 1e-6;

/// Conditional probability table for a variable given its parents.
///
/// The table has one row per combination of parent states and one column per
/// state of the variable. Rows are laid out with the first parent varying the
/// slowest, e.g. for parents A(a0, a1) and B(b0, b1) the row order is:
/// (a0, b0), (a0, b1), (a1, b0), (a1, b1).
///
/// A variable without parents has a single row, its prior distribution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpt {
    k: usize,
    parent_cards: SmallVec<[usize; 4]>,
    probs: Vec<f64>,
}

impl Cpt {
    /// Builds the table for a variable with `k` states and parents with the
    /// given number of states each. Every row must sum up to 1.
    pub fn new(
        var: &str,
        k: usize,
        parent_cards: &[usize],
        probs: Vec<f64>,
    ) -> Result<Cpt, NetError> {
        if k == 0 {
            return Err(NetError::NoStates(var.to_owned()));
        }
        let rows: usize = parent_cards.iter().product();
        let expected = rows * k;
        if probs.len() != expected {
            return Err(NetError::TableShape {
                var: var.to_owned(),
                expected,
                got: probs.len(),
            });
        }
        if let Some(value) = probs
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
        {
            return Err(NetError::IllegalProbability {
                var: var.to_owned(),
                value: *value,
            });
        }
        for (row, chunk) in probs.chunks(k).enumerate() {
            let sum: f64 = chunk.iter().sum();
            if !approx_eq!(f64, sum, 1.0, epsilon = ROW_SUM_EPSILON) {
                return Err(NetError::RowNotNormalized {
                    var: var.to_owned(),
                    row,
                    sum,
                });
            }
        }

        Ok(Cpt {
            k,
            parent_cards: parent_cards.iter().copied().collect(),
            probs,
        })
    }

    /// Number of states of the variable.
    #[inline]
    pub fn k_num(&self) -> usize {
        self.k
    }

    pub fn rows(&self) -> usize {
        self.probs.len() / self.k
    }

    /// Returns true if the table was built for parents with these number of states.
    pub fn fits(&self, k: usize, parent_cards: &[usize]) -> bool {
        self.k == k && self.parent_cards.as_slice() == parent_cards
    }

    fn row_index(&self, parent_states: &[usize]) -> Option<usize> {
        if parent_states.len() != self.parent_cards.len() {
            return None;
        }
        parent_states
            .iter()
            .zip(&self.parent_cards)
            .try_fold(0, |idx, (state, card)| {
                if state < card {
                    Some(idx * card + state)
                } else {
                    None
                }
            })
    }

    /// The distribution of the variable for the given parent states.
    pub fn row(&self, parent_states: &[usize]) -> Option<&[f64]> {
        let start = self.row_index(parent_states)? * self.k;
        Some(&self.probs[start..start + self.k])
    }

    /// P(state | parent_states), zero for out of range arguments.
    #[inline]
    pub fn prob(&self, state: usize, parent_states: &[usize]) -> f64 {
        self.row(parent_states)
            .and_then(|row| row.get(state).copied())
            .unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}
