use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use jpi_logbook::attribution::attribute;
use jpi_logbook::gazetteer::{GazetteerSources, load_airports_from};
use jpi_logbook::jpi::EdmDecoder;
use jpi_logbook::logbook::build_drafts;
use jpi_logbook::summary::summarize_log;

use super::fuel::read_invoice;
use super::{read_log, write_json};

/// Summarize every flight of a log into logbook drafts, optionally with a fuel invoice
pub fn handle_summarize(
    path: &Path,
    fuel: Option<&Path>,
    summaries_only: bool,
    sources: &GazetteerSources,
    max_km: f64,
    out: &mut dyn Write,
) -> Result<()> {
    let bytes = read_log(path)?;
    let summaries =
        summarize_log(&EdmDecoder, &bytes).with_context(|| format!("Summarizing {:?}", path))?;
    info!("{:?}: summarized {} flights", path, summaries.len());

    if summaries_only {
        return write_json(out, &summaries);
    }

    let gazetteer = load_airports_from(sources)?;
    let attributions: Vec<_> = summaries
        .iter()
        .map(|s| attribute(s, gazetteer.airports(), max_km))
        .collect();
    let invoice = fuel.map(read_invoice).transpose()?;

    write_json(out, &build_drafts(&summaries, &attributions, invoice))
}
