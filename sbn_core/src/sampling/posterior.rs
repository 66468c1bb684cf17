use std::collections::HashMap;
use std::fmt;

use crate::QueryErr;

/// Estimated posterior distribution of a variable.
///
/// Holds one entry per declared state, in declaration order, including
/// the states that were never visited by the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    var: String,
    probs: Vec<(String, f64)>,
    samples: usize,
}

impl Posterior {
    /// Normalizes the state visit counts, every count is divided by the total.
    pub(crate) fn from_counts(
        var: &str,
        states: &[String],
        counts: &[usize],
    ) -> Result<Posterior, QueryErr> {
        let magnitude: usize = counts.iter().sum();
        if magnitude == 0 {
            return Err(QueryErr::Degenerate(var.to_owned()));
        }
        let probs = states
            .iter()
            .zip(counts)
            .map(|(state, count)| (state.clone(), *count as f64 / magnitude as f64))
            .collect();
        Ok(Posterior {
            var: var.to_owned(),
            probs,
            samples: magnitude,
        })
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Number of samples the estimate is based on.
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn get(&self, state: &str) -> Option<f64> {
        self.probs
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probs.iter().map(|(s, p)| (s.as_str(), *p))
    }

    /// The state with the highest estimated probability, the first declared on ties.
    pub fn most_likely(&self) -> (&str, f64) {
        let mut best = (self.probs[0].0.as_str(), self.probs[0].1);
        for (s, p) in self.iter().skip(1) {
            if p > best.1 {
                best = (s, p);
            }
        }
        best
    }

    pub fn into_map(self) -> HashMap<String, f64> {
        self.probs.into_iter().collect()
    }
}

impl fmt::Display for Posterior {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "P({} | e) = {{", self.var)?;
        for (i, (state, p)) in self.probs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {:.4}", state, p)?;
        }
        write!(f, " }} (n = {})", self.samples)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn states() -> Vec<String> {
        vec!["low".into(), "mid".into(), "high".into()]
    }

    #[test]
    fn normalize_counts() {
        let post = Posterior::from_counts("level", &states(), &[1, 0, 3]).unwrap();
        assert_eq!(post.get("low"), Some(0.25));
        assert_eq!(post.get("mid"), Some(0.0));
        assert_eq!(post.get("high"), Some(0.75));
        assert_eq!(post.get("none"), None);
        assert_eq!(post.samples(), 4);
        assert_eq!(post.most_likely(), ("high", 0.75));

        let map = post.into_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["mid"], 0.0);
    }

    #[test]
    fn zero_magnitude_is_an_error() {
        let err = Posterior::from_counts("level", &states(), &[0, 0, 0]).unwrap_err();
        assert_eq!(err, QueryErr::Degenerate("level".into()));
    }

    #[test]
    fn display() {
        let post = Posterior::from_counts("level", &states(), &[1, 1, 2]).unwrap();
        assert_eq!(
            format!("{}", post),
            "P(level | e) = { low: 0.2500, mid: 0.2500, high: 0.5000 } (n = 4)"
        );
    }
}
