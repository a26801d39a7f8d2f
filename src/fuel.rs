//! Fuel invoice extraction.
//!
//! Works on the ordered text items of an invoice document. Getting those items
//! out of a PDF is left to a [`TextSource`] implementation.

use serde::Serialize;
use thiserror::Error;

/// Text item that sits between the gallon quantity and the dollar amount
pub const GALLONS_MARKER: &str = "Gallons";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceExtractionError {
    #[error("could not locate \"Gallons\" in invoice text")]
    MarkerMissing,
    #[error("\"Gallons\" is the first or last text item")]
    MarkerAtBoundary,
    #[error("gallon quantity {0:?} is not a number")]
    InvalidGallons(String),
    #[error("dollar amount {0:?} is not a number")]
    InvalidDollars(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelInvoice {
    pub fuel_gal: f64,
    pub fuel_dollars: f64,
}

/// Anything that yields the text items of a document in reading order
pub trait TextSource {
    fn text_items(&self) -> Vec<String>;
}

/// Already-extracted text, one item per non-blank line
#[derive(Debug, Clone)]
pub struct PlainText(pub String);

impl TextSource for PlainText {
    fn text_items(&self) -> Vec<String> {
        self.0
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl<S: AsRef<str>> TextSource for [S] {
    fn text_items(&self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

/// Gallons are the item before the first `Gallons` marker, dollars the item after it
pub fn extract_invoice_data<S: AsRef<str>>(
    items: &[S],
) -> Result<FuelInvoice, InvoiceExtractionError> {
    let idx = items
        .iter()
        .position(|i| i.as_ref().trim() == GALLONS_MARKER)
        .ok_or(InvoiceExtractionError::MarkerMissing)?;
    if idx == 0 || idx + 1 == items.len() {
        return Err(InvoiceExtractionError::MarkerAtBoundary);
    }

    let gallons_text = items[idx - 1].as_ref();
    let dollars_text = items[idx + 1].as_ref();
    let fuel_gal = parse_amount(gallons_text)
        .ok_or_else(|| InvoiceExtractionError::InvalidGallons(gallons_text.to_string()))?;
    let fuel_dollars = parse_amount(dollars_text)
        .ok_or_else(|| InvoiceExtractionError::InvalidDollars(dollars_text.to_string()))?;

    Ok(FuelInvoice {
        fuel_gal,
        fuel_dollars,
    })
}

pub fn extract_from_source<T: TextSource + ?Sized>(
    source: &T,
) -> Result<FuelInvoice, InvoiceExtractionError> {
    let items = source.text_items();
    extract_invoice_data(items.as_slice())
}

fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
