//! `meter-analytics` entry point: simulate, persist, detect anomalies and
//! print a per-city summary.

use std::process;

use chrono::Local;
use tracing::error;

use meter_analytics::cli::{self, Parsed};
use meter_analytics::logging;
use meter_analytics::runner;

fn main() {
    logging::init_tracing();

    let opts = match cli::parse_simulate_args() {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help) => {
            cli::print_simulate_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_simulate_usage();
            process::exit(1);
        }
    };

    let config = match opts.config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    match runner::run(&config, Local::now().naive_local()) {
        Ok(output) => {
            println!("{}", output.report);
            eprintln!(
                "{} readings written to {}",
                output.dataset.row_count(),
                config.data.path.display()
            );
        }
        Err(e) => {
            error!(error = %e, "simulation run failed");
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
