use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use jpi_logbook::airports::convert_airports;

/// Normalize an OurAirports CSV or airport JSON file into the gazetteer dataset format
pub fn handle_convert_airports(input: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let count = convert_airports(input, dest)?;
    info!("Converted {:?} -> {:?} ({} airports)", input, dest, count);
    Ok(())
}
