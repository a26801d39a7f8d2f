use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use jpi_logbook::fuel::{FuelInvoice, PlainText, extract_from_source};

use super::write_json;

/// Read an invoice's extracted text (one item per line) and pull out the fuel purchase
pub fn read_invoice(path: &Path) -> Result<FuelInvoice> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    extract_from_source(&PlainText(text)).with_context(|| format!("Extracting fuel from {:?}", path))
}

pub fn handle_fuel(path: &Path, out: &mut dyn Write) -> Result<()> {
    let invoice = read_invoice(path)?;
    write_json(out, &invoice)
}
