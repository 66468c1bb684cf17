//! Core functionality for sbn: discrete Bayesian networks and approximate
//! inference over them with a Gibbs sampler.

// clippy lints config:
#![allow(unknown_lints)]

pub mod config;
mod errors;
mod lang;
mod net;
pub mod sampling;
#[cfg(feature = "persistence")]
mod storage;

pub use self::config::{init_logger, SamplerConf};
pub use self::errors::{ConfErr, NetError, ParseErr, QueryErr};
pub use self::lang::{parse_net, write_net};
pub use self::net::{normalize_name, Cpt, Net, Variable};
pub use self::sampling::{Flow, Gibbs, Posterior};
