pub mod convert_airports;
pub mod decode;
pub mod flights;
pub mod fuel;
pub mod nearest;
pub mod summarize;

pub use convert_airports::handle_convert_airports;
pub use decode::{DecodeOutput, handle_decode};
pub use flights::handle_flights;
pub use fuel::handle_fuel;
pub use nearest::handle_nearest;
pub use summarize::handle_summarize;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

fn read_log(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Pretty JSON followed by a newline
fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Writing JSON output")?;
    writeln!(out)?;
    Ok(())
}
