//! Command execution handlers

use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

use crate::client::AbnLookupClient;
use crate::types::{AuthenticationGuid, Record};

use super::commands::Cli;

/// How records are written to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Stop after this many records
    pub limit: Option<usize>,
    /// Pretty-print each record instead of one JSON document per line
    pub pretty: bool,
}

/// Run the search selected on the command line and print its records
pub async fn run(cli: Cli) -> Result<()> {
    let guid = AuthenticationGuid::resolve(cli.guid.as_deref())
        .context("No authentication GUID: pass --guid or set ABN_LOOKUP_GUID")?;
    let config = cli.client_config();
    let options = OutputOptions {
        limit: cli.limit,
        pretty: cli.pretty,
    };

    debug!("Running {} against {}", cli.command.kind().command(), config.base_url);
    let search = cli.command.into_search()?;
    let client = AbnLookupClient::with_guid(guid, config)?;

    let results = client.search(&search).await?;
    let stdout = std::io::stdout();
    let printed = write_records(&mut stdout.lock(), results, &options)?;
    debug!("Printed {} record(s)", printed);

    Ok(())
}

/// Write records to `out`, honouring the limit; returns how many were written
pub fn write_records<W: Write>(
    out: &mut W,
    records: impl Iterator<Item = Record>,
    options: &OutputOptions,
) -> Result<usize> {
    let mut count = 0;
    for record in records.take(options.limit.unwrap_or(usize::MAX)) {
        if options.pretty {
            serde_json::to_writer_pretty(&mut *out, &record)?;
        } else {
            serde_json::to_writer(&mut *out, &record)?;
        }
        writeln!(out)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
