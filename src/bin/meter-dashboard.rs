//! `meter-dashboard` entry point: web dashboard by default, terminal UI with
//! `--tui`.

use std::process;

use meter_analytics::cli::{self, DashboardOptions, Parsed};
use meter_analytics::dashboard::Session;
use meter_analytics::logging;

fn main() {
    let opts = match cli::parse_dashboard_args() {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help) => {
            cli::print_dashboard_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_dashboard_usage();
            process::exit(1);
        }
    };

    // Log lines would corrupt the alternate screen.
    if !opts.tui {
        logging::init_tracing();
    }

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

    let session = match Session::open(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = launch(&opts, session) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn launch(opts: &DashboardOptions, session: Session) -> Result<(), String> {
    if opts.tui {
        run_tui(session)
    } else {
        run_web(session)
    }
}

#[cfg(feature = "tui")]
fn run_tui(session: Session) -> Result<(), String> {
    meter_analytics::tui::run(session).map_err(|e| format!("terminal UI failed: {e}"))
}

#[cfg(not(feature = "tui"))]
fn run_tui(_session: Session) -> Result<(), String> {
    Err("built without the `tui` feature".to_string())
}

#[cfg(feature = "api")]
fn run_web(session: Session) -> Result<(), String> {
    use std::net::{IpAddr, SocketAddr};

    use meter_analytics::api::{self, AppState};

    let dashboard = &session.config().dashboard;
    let ip: IpAddr = dashboard
        .bind
        .parse()
        .map_err(|_| format!("invalid bind address \"{}\"", dashboard.bind))?;
    let addr = SocketAddr::new(ip, dashboard.port);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to create tokio runtime: {e}"))?;
    rt.block_on(api::serve(AppState::new(session), addr))
        .map_err(|e| format!("server on {addr} failed: {e}"))
}

#[cfg(not(feature = "api"))]
fn run_web(_session: Session) -> Result<(), String> {
    Err("built without the `api` feature; use --tui".to_string())
}
