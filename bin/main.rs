//! sbn
//!
//! Approximate posterior queries over a discrete Bayesian network read from a file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sbn_core::{init_logger, Gibbs, Net, SamplerConf};

const USAGE: &str = "usage: sbn <network-file> --query <var> [<var>...] [--samples N] [--seed N]
           [--burn-in N] [--thinning N] [--evidence name=state ...] [--config <file>]";

struct Args {
    file: PathBuf,
    opts: HashMap<String, Vec<String>>,
}

impl Args {
    /// Groups the arguments by option, every `--name` takes the values up to the next option.
    fn parse(raw: impl Iterator<Item = String>) -> Result<Args, String> {
        let mut file = None;
        let mut opts: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<String> = None;
        for arg in raw {
            if let Some(opt) = arg.strip_prefix("--") {
                opts.entry(opt.to_owned()).or_default();
                current = Some(opt.to_owned());
            } else if let Some(opt) = &current {
                opts.entry(opt.clone()).or_default().push(arg);
            } else if file.is_none() {
                file = Some(PathBuf::from(arg));
            } else {
                return Err(format!("unexpected argument `{}`", arg));
            }
        }
        if opts.contains_key("help") {
            return Err(USAGE.to_owned());
        }
        let file = file.ok_or_else(|| USAGE.to_owned())?;
        Ok(Args { file, opts })
    }

    fn values(&self, opt: &str) -> &[String] {
        self.opts.get(opt).map(Vec::as_slice).unwrap_or(&[])
    }

    fn single(&self, opt: &str) -> Result<Option<&str>, String> {
        match self.opts.get(opt).map(Vec::as_slice) {
            None => Ok(None),
            Some([value]) => Ok(Some(value.as_str())),
            Some(_) => Err(format!("--{} takes exactly one value", opt)),
        }
    }

    fn number(&self, opt: &str) -> Result<Option<u64>, String> {
        self.single(opt)?
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| format!("--{}: `{}` is not a non-negative integer", opt, v))
            })
            .transpose()
    }

    fn sampler_conf(&self) -> Result<SamplerConf, String> {
        let conf_file = self.single("config")?.map(Path::new);
        let mut conf = SamplerConf::load_conf_from(conf_file).map_err(|e| e.to_string())?;
        if let Some(n) = self.number("samples")? {
            conf.sample_count = n as usize;
        }
        if let Some(n) = self.number("burn-in")? {
            conf.burn_in = n as usize;
        }
        if let Some(n) = self.number("thinning")? {
            conf.thinning = n as usize;
        }
        if let Some(n) = self.number("seed")? {
            conf.seed = Some(n);
        }
        Ok(conf)
    }
}

/// Splits a `name=state` evidence assignment.
fn parse_assignment(assignment: &str) -> Result<(&str, &str), String> {
    let mut parts = assignment.splitn(2, '=');
    match (parts.next(), parts.next()) {
        (Some(var), Some(state)) if !var.trim().is_empty() && !state.trim().is_empty() => {
            Ok((var, state))
        }
        _ => Err(format!(
            "--evidence: expected name=state, got `{}`",
            assignment
        )),
    }
}

fn load_net(path: &Path) -> Result<Net, String> {
    #[cfg(feature = "persistence")]
    {
        if path.extension().map(|ext| ext == "bin").unwrap_or(false) {
            return Net::load_from_disc(path).map_err(|e| format!("{}: {}", path.display(), e));
        }
    }
    let source =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    source
        .parse::<Net>()
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn run(args: Args) -> Result<(), String> {
    let mut net = load_net(&args.file)?;
    for assignment in args.values("evidence") {
        let (var, state) = parse_assignment(assignment)?;
        net.add_evidence(var, state).map_err(|e| e.to_string())?;
    }

    let queries = args.values("query");
    if queries.is_empty() {
        return Err("nothing to query, use --query <var>".to_owned());
    }
    let conf = args.sampler_conf()?;
    let sampler = Gibbs::from_conf(&conf);
    log::info!(
        "querying network `{}`: {} samples, burn-in {}, thinning {}",
        net.name(),
        sampler.samples(),
        sampler.burn_in(),
        sampler.thinning()
    );

    for var in queries {
        let step = (sampler.samples() / 10).max(1);
        let mut done = 0;
        let posterior = net
            .query_with(&sampler, var, |p| {
                done += 1;
                if done % step == 0 {
                    log::debug!("{}: {:.0}%", var, p * 100.0);
                }
            })
            .map_err(|e| e.to_string())?;
        println!("{}", posterior);
    }
    Ok(())
}

fn main() {
    init_logger();
    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    if let Err(msg) = result {
        eprintln!("{}", msg);
        std::process::exit(1);
    }
}
