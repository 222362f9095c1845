//! Command-line parsing shared by the `meter-analytics` and
//! `meter-dashboard` binaries.

use std::env;
use std::path::PathBuf;

use crate::config::AnalyticsConfig;

/// Outcome of parsing: run with options, or print usage and exit 0.
#[derive(Debug, PartialEq)]
pub enum Parsed<T> {
    Run(T),
    Help,
}

/// Where the configuration comes from. `--config` and `--preset` are
/// mutually exclusive; neither means the `turkey10` preset.
#[derive(Debug, Default, PartialEq)]
pub struct ConfigSource {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
}

impl ConfigSource {
    /// Loads and returns the selected configuration, without validating it.
    ///
    /// # Errors
    ///
    /// Returns the config error text for an unreadable file or unknown preset.
    pub fn load(&self) -> Result<AnalyticsConfig, String> {
        match (&self.config, &self.preset) {
            (Some(path), _) => AnalyticsConfig::from_toml_file(path).map_err(|e| e.to_string()),
            (None, Some(name)) => AnalyticsConfig::from_preset(name).map_err(|e| e.to_string()),
            (None, None) => Ok(AnalyticsConfig::turkey10()),
        }
    }

    /// Consumes `--config`/`--preset` at `args[*i]`. Returns `Ok(false)` for
    /// any other argument.
    fn take(&mut self, args: &[String], i: &mut usize) -> Result<bool, String> {
        match args[*i].as_str() {
            "--config" => {
                *i += 1;
                let path =
                    args.next_or_err(*i, "missing value for --config (expected a TOML file path)")?;
                if self.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                *i += 1;
                let name =
                    args.next_or_err(*i, "missing value for --preset (expected a preset name)")?;
                if self.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn check(&self) -> Result<(), String> {
        if self.config.is_some() && self.preset.is_some() {
            return Err(
                "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// `meter-analytics` options.
#[derive(Debug, Default, PartialEq)]
pub struct SimulateOptions {
    pub source: ConfigSource,
    pub seed: Option<u64>,
    pub hours: Option<usize>,
    pub out: Option<PathBuf>,
}

impl SimulateOptions {
    /// Loads the configuration and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// See [`ConfigSource::load`].
    pub fn config(&self) -> Result<AnalyticsConfig, String> {
        let mut config = self.source.load()?;
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(hours) = self.hours {
            config.simulation.hours = hours;
        }
        if let Some(out) = &self.out {
            config.data.path = out.clone();
        }
        Ok(config)
    }
}

/// `meter-dashboard` options.
#[derive(Debug, Default, PartialEq)]
pub struct DashboardOptions {
    pub source: ConfigSource,
    pub tui: bool,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub data: Option<PathBuf>,
}

impl DashboardOptions {
    /// Loads the configuration and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// See [`ConfigSource::load`].
    pub fn config(&self) -> Result<AnalyticsConfig, String> {
        let mut config = self.source.load()?;
        if let Some(bind) = &self.bind {
            config.dashboard.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.dashboard.port = port;
        }
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        Ok(config)
    }
}

pub fn parse_simulate_args() -> Result<Parsed<SimulateOptions>, String> {
    parse_simulate_args_from(env::args().skip(1).collect())
}

pub fn parse_simulate_args_from(args: Vec<String>) -> Result<Parsed<SimulateOptions>, String> {
    let mut opts = SimulateOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        if opts.source.take(&args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--hours" => {
                i += 1;
                let raw =
                    args.next_or_err(i, "missing value for --hours (expected a positive integer)")?;
                let hours = raw
                    .parse()
                    .ok()
                    .filter(|&h: &usize| h > 0)
                    .ok_or_else(|| format!("--hours value \"{raw}\" is not a positive integer"))?;
                opts.hours = Some(hours);
            }
            "--out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --out (expected a CSV file path)")?;
                if opts.out.replace(PathBuf::from(path)).is_some() {
                    return Err("--out provided more than once".to_string());
                }
            }
            "--help" | "-h" => return Ok(Parsed::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    opts.source.check()?;
    Ok(Parsed::Run(opts))
}

pub fn parse_dashboard_args() -> Result<Parsed<DashboardOptions>, String> {
    parse_dashboard_args_from(env::args().skip(1).collect())
}

pub fn parse_dashboard_args_from(args: Vec<String>) -> Result<Parsed<DashboardOptions>, String> {
    let mut opts = DashboardOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        if opts.source.take(&args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--tui" => opts.tui = true,
            "--bind" => {
                i += 1;
                let addr =
                    args.next_or_err(i, "missing value for --bind (expected an IP address)")?;
                opts.bind = Some(addr.to_string());
            }
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let port = raw
                    .parse()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
                opts.port = Some(port);
            }
            "--data" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --data (expected a CSV file path)")?;
                opts.data = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(Parsed::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.tui && (opts.bind.is_some() || opts.port.is_some()) {
        return Err("`--bind`/`--port` only apply to the web dashboard, not `--tui`".to_string());
    }
    opts.source.check()?;
    Ok(Parsed::Run(opts))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_simulate_usage() {
    eprintln!("meter-analytics: simulate hourly city consumption and flag anomalies");
    eprintln!();
    eprintln!("Usage: meter-analytics [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>   Load configuration from a TOML file");
    eprintln!("  --preset <name>   Use a built-in preset (turkey10, turkey81)");
    eprintln!("  --seed <u64>      Override the random seed");
    eprintln!("  --hours <n>       Override the number of simulated hours");
    eprintln!("  --out <path>      Write readings to this CSV instead of data.path");
    eprintln!("  --help            Show this help message");
}

pub fn print_dashboard_usage() {
    eprintln!("meter-dashboard: browse consumption, anomalies and forecasts");
    eprintln!();
    eprintln!("Usage: meter-dashboard [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>   Load configuration from a TOML file");
    eprintln!("  --preset <name>   Use a built-in preset (turkey10, turkey81)");
    eprintln!("  --data <path>     Read readings from this CSV instead of data.path");
    eprintln!("  --tui             Run the terminal dashboard instead of the web one");
    eprintln!("  --bind <addr>     Web dashboard bind address");
    eprintln!("  --port <u16>      Web dashboard port");
    eprintln!("  --help            Show this help message");
}
