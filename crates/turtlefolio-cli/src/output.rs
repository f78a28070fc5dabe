use std::io::{self, Write};

use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, result, pretty)?,
        OutputFormat::Table => write_table(&mut out, result)?,
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write>(out: &mut W, result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let document = json!({
        "data": result.data,
        "warnings": result.warnings,
    });
    let payload = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

fn write_table<W: Write>(out: &mut W, result: &CommandResult) -> Result<(), CliError> {
    for line in &result.lines {
        writeln!(out, "{line}")?;
    }
    for warning in &result.warnings {
        writeln!(out, "{warning}")?;
    }
    Ok(())
}
