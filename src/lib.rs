//! Engine-monitor (JPI/EDM) log decoding and logbook derivation.
//!
//! Raw log bytes go through [`jpi`] into per-flight sample rows, [`summary`]
//! reduces each flight to times and fixes, [`attribution`] matches fixes to
//! airports from the [`gazetteer`], and [`logbook`] assembles draft entries
//! together with [`fuel`] invoice data.

pub mod airports;
pub mod attribution;
pub mod config;
pub mod coordinates;
pub mod fuel;
pub mod gazetteer;
pub mod jpi;
pub mod log_format;
pub mod logbook;
pub mod samples;
pub mod summary;

pub use airports::Airport;
pub use attribution::{AirportAttribution, attribute};
pub use coordinates::{haversine_distance_km, parse_coordinate};
pub use fuel::{FuelInvoice, InvoiceExtractionError, extract_invoice_data};
pub use gazetteer::{load_airports, nearest_airport};
pub use jpi::{DecodeError, EdmDecoder, FlightIndexEntry, FlightLogDecoder, decode_flight, parse_log};
pub use logbook::{LogbookDraft, build_drafts};
pub use samples::{FieldTag, FlightSampleRow};
pub use summary::{FlightSummary, summarize, summarize_log};
