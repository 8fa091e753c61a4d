//! Basic ABN lookup example for the ABN Lookup library.
//!
//! This example demonstrates how to:
//! - Create a client from the environment
//! - Look up a single ABN
//! - Run a name search and walk the results
//! - Handle errors gracefully
//!
//! Usage:
//! ```
//! ABN_LOOKUP_GUID=your-guid cargo run --example basic_search -- 53004085616 Telstra
//! ```

use abn_lookup::{AbnLookupClient, AbnLookupError, Search};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <abn> <name>", args[0]);
        eprintln!("Example: {} 53004085616 Telstra", args[0]);
        std::process::exit(1);
    }
    let (abn, name) = (&args[1], &args[2]);

    let client = match AbnLookupClient::from_env() {
        Ok(client) => client,
        Err(AbnLookupError::MissingParameter { .. }) => {
            eprintln!("Set ABN_LOOKUP_GUID to your ABR authentication GUID");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("Looking up ABN: {}", abn);
    match client.search_by_abn(abn, false).await {
        Ok(entity) => {
            println!("\n=== Entity ===");
            if let Some(id) = entity.identifier() {
                println!("ABN: {}", id);
            }
            if let Some(status) = entity.identifier_status() {
                println!("Status: {}", status);
            }
            if let Some(name) = entity.organisation_name() {
                println!("Name: {}", name);
            }
            if let (Some(state), Some(postcode)) = (entity.state_code(), entity.postcode()) {
                println!("Location: {} {}", state, postcode);
            }
        }
        Err(AbnLookupError::Upstream { code, description }) => {
            eprintln!("ABR rejected the lookup ({}): {}", code, description);
        }
        Err(e) => {
            eprintln!("Lookup error: {}", e);
        }
    }

    println!("\nSearching for names matching: {}", name);
    let results = client.search(&Search::name(name.as_str())).await?;
    println!("{} match(es)", results.len());
    for record in results.take(10) {
        println!(
            "  {:<12} {:<8} {}",
            record.identifier().unwrap_or("-"),
            record.state_code().unwrap_or("-"),
            record.organisation_name().unwrap_or("-"),
        );
    }

    Ok(())
}
