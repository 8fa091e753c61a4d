//! ABN Lookup CLI
//!
//! Command-line interface for the Australian Business Register search API.

use abn_lookup::cli::{run, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the GUID may come from --guid or the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "abn_lookup=debug"
    } else {
        "abn_lookup=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let verbose = cli.verbose;
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }
}
