//! Config command: prints the effective configuration.

use super::init::output_error;
use crate::Result;
use crate::config::TraceContextConfig;
use std::io::Write;

/// Writes the effective configuration with secrets redacted.
///
/// # Errors
///
/// Returns an error if output fails.
pub fn cmd_config<W: Write>(config: &TraceContextConfig, out: &mut W) -> Result<()> {
    write!(out, "{}", config.describe()).map_err(output_error)
}
