use std::convert::TryFrom;
use std::path::Path;
use std::str::FromStr;

use log::LevelFilter;
use once_cell::sync::Lazy;

use crate::errors::ConfErr;
use crate::sampling::{DEFAULT_BURN_IN, DEFAULT_THINNING, MCMC_DEFAULT_SAMPLE_COUNT};

static CONF: Lazy<LogConf> = Lazy::new(|| {
    let log_level = std::env::var("SBN_LOG_LEVEL")
        .or_else::<std::env::VarError, _>(|_| Ok("info".to_owned()))
        .ok()
        .map(|l| LevelFilter::from_str(&l).unwrap_or(LevelFilter::Debug))
        .unwrap_or(LevelFilter::Debug);

    LogConf { log_level }
});

struct LogConf {
    log_level: log::LevelFilter,
}

/// Sampler settings, see `SamplerConf::load_conf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConf {
    pub sample_count: usize,
    pub burn_in: usize,
    pub thinning: usize,
    pub seed: Option<u64>,
}

impl Default for SamplerConf {
    fn default() -> Self {
        SamplerConf {
            sample_count: MCMC_DEFAULT_SAMPLE_COUNT,
            burn_in: DEFAULT_BURN_IN,
            thinning: DEFAULT_THINNING,
            seed: None,
        }
    }
}

impl SamplerConf {
    /// Loads the configuration from the environment (`SBN_` prefixed variables).
    pub fn load_conf() -> Result<SamplerConf, ConfErr> {
        Self::load_conf_from(None)
    }

    /// Loads the configuration from an optional file, values set in the
    /// environment (`SBN_SAMPLE_COUNT`, `SBN_BURN_IN`, `SBN_THINNING`, `SBN_SEED`)
    /// take precedence over the ones in the file.
    pub fn load_conf_from(path: Option<&Path>) -> Result<SamplerConf, ConfErr> {
        let mut settings = config::Config::default();
        settings.set_default("sample_count", MCMC_DEFAULT_SAMPLE_COUNT as i64)?;
        settings.set_default("burn_in", DEFAULT_BURN_IN as i64)?;
        settings.set_default("thinning", DEFAULT_THINNING as i64)?;
        if let Some(path) = path {
            settings.merge(config::File::from(path))?;
        }
        settings.merge(config::Environment::with_prefix("SBN"))?;

        let sample_count = positive("sample_count", settings.get_int("sample_count")?)?;
        let burn_in = non_negative("burn_in", settings.get_int("burn_in")?)?;
        let thinning = positive("thinning", settings.get_int("thinning")?)?;
        let seed = match settings.get_int("seed") {
            Ok(seed) => Some(u64::try_from(seed).map_err(|_| ConfErr::OutOfRange {
                key: "seed",
                value: seed,
            })?),
            Err(config::ConfigError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(SamplerConf {
            sample_count,
            burn_in,
            thinning,
            seed,
        })
    }
}

fn non_negative(key: &'static str, value: i64) -> Result<usize, ConfErr> {
    usize::try_from(value).map_err(|_| ConfErr::OutOfRange { key, value })
}

fn positive(key: &'static str, value: i64) -> Result<usize, ConfErr> {
    match non_negative(key, value)? {
        0 => Err(ConfErr::OutOfRange { key, value }),
        v => Ok(v),
    }
}

pub(crate) mod tracing {
    use super::*;

    #[derive(Clone, Copy)]
    pub struct Logger;

    impl Logger {
        pub fn get_logger() -> &'static Logger {
            Lazy::force(&LOGGER)
        }
    }

    #[allow(unused_must_use)]
    static LOGGER: Lazy<Logger> = Lazy::new(|| {
        env_logger::builder()
            .format_module_path(true)
            .format_timestamp_nanos()
            .target(env_logger::Target::Stderr)
            .filter(None, CONF.log_level)
            .try_init();

        Logger
    });
}

/// Initializes the logger, the level is read from `SBN_LOG_LEVEL`.
pub fn init_logger() {
    tracing::Logger::get_logger();
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_file_and_env() {
        let path = std::env::temp_dir().join(format!("sbn_conf_{}.toml", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "sample_count = 500").unwrap();
            writeln!(file, "burn_in = 10").unwrap();
        }
        let conf = SamplerConf::load_conf_from(Some(&path)).unwrap();
        assert_eq!(conf.sample_count, 500);
        assert_eq!(conf.burn_in, 10);
        assert_eq!(conf.thinning, DEFAULT_THINNING);
        assert_eq!(conf.seed, None);

        std::env::set_var("SBN_SEED", "42");
        std::env::set_var("SBN_SAMPLE_COUNT", "800");
        let conf = SamplerConf::load_conf_from(Some(&path)).unwrap();
        assert_eq!(conf.sample_count, 800);
        assert_eq!(conf.seed, Some(42));

        std::env::set_var("SBN_THINNING", "0");
        assert!(SamplerConf::load_conf_from(Some(&path)).is_err());

        std::env::remove_var("SBN_SEED");
        std::env::remove_var("SBN_SAMPLE_COUNT");
        std::env::remove_var("SBN_THINNING");
        std::fs::remove_file(&path).unwrap();
    }
}
