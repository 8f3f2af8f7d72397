//! Status, search and reset commands against a running orchestrator.

use super::init::output_error;
use crate::client::OrchestratorApi;
use crate::{Error, Result};
use std::io::Write;

/// Hint printed when the orchestrator cannot be reached.
pub const OFFLINE_HINT: &str =
    "Orchestrator is offline.\nStart it with: tracecontext serve";

/// Prints the orchestrator status.
///
/// An offline orchestrator is reported, not treated as a failure.
///
/// # Errors
///
/// Returns an error for failures other than an unreachable orchestrator.
pub fn cmd_status<W: Write>(api: &dyn OrchestratorApi, out: &mut W) -> Result<()> {
    match api.health() {
        Ok(health) => {
            writeln!(out, "Orchestrator Status: {}", health.status).map_err(output_error)?;
            if !health.version.is_empty() {
                writeln!(out, "Version: {}", health.version).map_err(output_error)?;
            }
            Ok(())
        },
        Err(Error::Unavailable(_)) => writeln!(out, "{OFFLINE_HINT}").map_err(output_error),
        Err(e) => Err(e),
    }
}

/// Prints every record matching `query`, one block per record.
///
/// # Errors
///
/// Returns an error for failures other than an unreachable orchestrator.
pub fn cmd_search<W: Write>(api: &dyn OrchestratorApi, query: &str, out: &mut W) -> Result<()> {
    let records = match api.context(Some(query)) {
        Ok(records) => records,
        Err(Error::Unavailable(_)) => return writeln!(out, "{OFFLINE_HINT}").map_err(output_error),
        Err(e) => return Err(e),
    };

    if records.is_empty() {
        return writeln!(out, "No relevant context found.").map_err(output_error);
    }

    for (i, record) in records.iter().enumerate() {
        writeln!(out, "── Context Found ({}/{}) ──", i + 1, records.len()).map_err(output_error)?;
        writeln!(out, "{record}").map_err(output_error)?;
        writeln!(out).map_err(output_error)?;
    }
    Ok(())
}

/// Clears the context store.
///
/// # Errors
///
/// Returns an error if the request fails, including when the orchestrator
/// is offline.
pub fn cmd_reset<W: Write>(api: &dyn OrchestratorApi, out: &mut W) -> Result<()> {
    let cleared = api.reset()?;
    writeln!(out, "Context store cleared ({cleared} record(s) removed).").map_err(output_error)
}
