use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use jpi_logbook::jpi::JpiLog;

use super::{read_log, write_json};

/// List the flights stored in a log
pub fn handle_flights(path: &Path, out: &mut dyn Write) -> Result<()> {
    let bytes = read_log(path)?;
    let log = JpiLog::parse(&bytes).with_context(|| format!("Parsing {:?}", path))?;

    info!(
        "{:?}: {} flights (tail {}, model {})",
        path,
        log.index().len(),
        log.header().tail_number.as_deref().unwrap_or("unknown"),
        log.header().model.as_deref().unwrap_or("unknown"),
    );
    write_json(out, log.index())
}
