//! Toyu Ledger - kerosene delivery ledger
//!
//! A CLI tool that records tank fill-ups per customer, exports unexported
//! deliveries as sales CSV for the accounting software, and keeps backups.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,toyu=debug"
    } else {
        "warn,toyu=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
