//! Gibbs sampling for pure discrete models.
//!
//! MCMC generates each event by making a random change to the preceding event.
//! The next state is generated by sampling a value for one of the non-evidence
//! variables, conditioned on the current values of the variables in its Markov
//! blanket. The chain wanders around the space of complete assignments flipping
//! one variable at a time while the evidence stays fixed, and the long-run
//! fraction of time spent in each state is proportional to its posterior probability.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    generate_random_event, DiscreteModel, DiscreteNode, Event, Posterior, VarId,
    DEFAULT_BURN_IN, DEFAULT_THINNING, MCMC_DEFAULT_SAMPLE_COUNT,
};
use crate::config::SamplerConf;
use crate::{NetError, QueryErr};

/// Returned by a query control callback to keep going or end the query early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Single chain Gibbs sampler.
///
/// By default every one of the `samples` iterations is counted, using the state
/// of the query variable *before* the sweep of that iteration, and no event is
/// discarded. Burn-in and thinning must be asked for explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gibbs {
    samples: usize,
    burn_in: usize,
    thinning: usize,
    seed: Option<u64>,
}

impl Default for Gibbs {
    fn default() -> Self {
        Gibbs::new(None, None)
    }
}

impl Gibbs {
    pub fn new(samples: Option<usize>, burn_in: Option<usize>) -> Gibbs {
        Gibbs {
            samples: samples.unwrap_or(MCMC_DEFAULT_SAMPLE_COUNT),
            burn_in: burn_in.unwrap_or(DEFAULT_BURN_IN),
            thinning: DEFAULT_THINNING,
            seed: None,
        }
    }

    pub fn from_conf(conf: &SamplerConf) -> Gibbs {
        Gibbs {
            samples: conf.sample_count,
            burn_in: conf.burn_in,
            thinning: conf.thinning,
            seed: conf.seed,
        }
    }

    /// Number of sweeps between two counted samples.
    pub fn with_thinning(mut self, thinning: usize) -> Gibbs {
        self.thinning = thinning;
        self
    }

    /// Draw from a generator seeded with `seed` instead of one seeded from OS entropy.
    pub fn with_seed(mut self, seed: u64) -> Gibbs {
        self.seed = Some(seed);
        self
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn burn_in(&self) -> usize {
        self.burn_in
    }

    pub fn thinning(&self) -> usize {
        self.thinning
    }

    /// Estimates the posterior distribution of `var` given the evidence set on `net`.
    ///
    /// `progress` is called once per counted sample with the fraction of
    /// completion, in [0, 1).
    pub fn query<M, F>(&self, net: &M, var: &str, mut progress: F) -> Result<Posterior, QueryErr>
    where
        M: DiscreteModel,
        F: FnMut(f64),
    {
        self.query_with_control(net, var, |p| {
            progress(p);
            Flow::Continue
        })
    }

    /// Same as `query`, but the callback can end the query early, in which case
    /// the samples counted up to that point are normalized.
    pub fn query_with_control<M, F>(
        &self,
        net: &M,
        var: &str,
        control: F,
    ) -> Result<Posterior, QueryErr>
    where
        M: DiscreteModel,
        F: FnMut(f64) -> Flow,
    {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.query_with_rng(net, var, &mut rng, control)
    }

    pub fn query_with_rng<M, R, F>(
        &self,
        net: &M,
        var: &str,
        rng: &mut R,
        mut control: F,
    ) -> Result<Posterior, QueryErr>
    where
        M: DiscreteModel,
        R: Rng + ?Sized,
        F: FnMut(f64) -> Flow,
    {
        if self.samples == 0 {
            return Err(QueryErr::NonPositiveSampleCount);
        }
        if self.thinning == 0 {
            return Err(QueryErr::NonPositiveThinning);
        }
        let query_id = net
            .var_id(var)
            .ok_or_else(|| QueryErr::UnknownVariable(var.to_owned()))?;
        net.validate()?;

        let query = &net.nodes()[query_id];
        log::debug!(
            "querying `{}` with {} samples (burn-in: {}, thinning: {})",
            query.name(),
            self.samples,
            self.burn_in,
            self.thinning
        );

        // keep track of number of times a state has been observed
        let mut counts = vec![0_usize; query.states().len()];
        let mut chain = Chain::new(net, rng)?;
        for _ in 0..self.burn_in {
            chain.sweep();
        }
        for n in 0..self.samples {
            let state = chain
                .event()
                .get(query_id)
                .ok_or_else(|| QueryErr::Degenerate(query.name().to_owned()))?;
            match counts.get_mut(state) {
                Some(count) => *count += 1,
                None => {
                    return Err(QueryErr::UnknownState {
                        var: query.name().to_owned(),
                        state: format!("#{}", state),
                    })
                }
            }
            for _ in 0..self.thinning {
                chain.sweep();
            }
            if control(n as f64 / self.samples as f64) == Flow::Stop {
                log::debug!("query for `{}` stopped after {} samples", query.name(), n + 1);
                break;
            }
        }
        log::trace!("state counts for `{}`: {:?}", query.name(), counts);

        Posterior::from_counts(query.name(), query.states(), &counts)
    }
}

/// A Markov chain over the complete events of a network.
///
/// The chain owns its event; the evidence of the network is copied into it when
/// the chain is created and is never touched again.
pub struct Chain<'a, M, R: ?Sized> {
    net: &'a M,
    rng: &'a mut R,
    event: Event,
    resampled: Vec<VarId>,
    sweeps: usize,
}

impl<'a, M, R> Chain<'a, M, R>
where
    M: DiscreteModel,
    R: Rng + ?Sized,
{
    /// Starts a chain from a random event generated in ancestral order.
    pub fn new(net: &'a M, rng: &'a mut R) -> Result<Chain<'a, M, R>, NetError> {
        let event = generate_random_event(net, rng)?;
        let evidence = net.evidence();
        let resampled = net
            .nodes()
            .iter()
            .filter(|n| !n.is_set_in_evidence(evidence))
            .map(|n| n.position())
            .collect();
        Ok(Chain {
            net,
            rng,
            event,
            resampled,
            sweeps: 0,
        })
    }

    /// Resamples once every non-evidence variable, each one conditioned on the
    /// current event (including the values already updated in this sweep).
    pub fn sweep(&mut self) {
        let nodes = self.net.nodes();
        for var in &self.resampled {
            let state = nodes[*var].sample_given_markov_blanket(self.net, &self.event, self.rng);
            self.event.set(*var, state);
        }
        self.sweeps += 1;
    }

    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Variables updated on each sweep, in update order.
    pub fn resampled(&self) -> &[VarId] {
        &self.resampled
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
}
