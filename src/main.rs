//! HTTP Load Tester - Main CLI Application
//!
//! Issues concurrent GET requests against a target and reports per-phase
//! latency statistics.

use clap::Parser;
use http_load_tester::{app::App, cli::Cli, error::ErrorReporter};
use std::io::IsTerminal;
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(
        !cli.no_color && std::io::stderr().is_terminal(),
        cli.verbose || cli.debug,
    );

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    // Failed requests are part of the report, not a process failure
    if let Err(e) = result {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}
