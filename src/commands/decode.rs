use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io::Write;
use std::path::Path;

use jpi_logbook::jpi::decode_flight;
use jpi_logbook::samples::{track, write_csv};

use super::{read_log, write_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecodeOutput {
    /// Sample rows as JSON objects
    Json,
    /// Sample rows as CSV with a header line
    Csv,
    /// Index/time/altitude/position series
    Track,
}

/// Decode one flight of a log into sample rows
pub fn handle_decode(
    path: &Path,
    flight_id: u32,
    output: DecodeOutput,
    out: &mut dyn Write,
) -> Result<()> {
    let bytes = read_log(path)?;
    let rows = decode_flight(&bytes, flight_id)
        .with_context(|| format!("Decoding flight {} of {:?}", flight_id, path))?;

    match output {
        DecodeOutput::Json => write_json(out, &rows),
        DecodeOutput::Track => write_json(out, &track(&rows)),
        DecodeOutput::Csv => write_csv(&rows, out).context("Writing CSV"),
    }
}
