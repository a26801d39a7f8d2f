//! ASCII header of a JPI log.
//!
//! Every header line has the form `$K,field,field*HH` followed by CRLF (a bare
//! LF is accepted too). `HH` is the XOR of all bytes between `$` and `*`, in
//! hex. Records used here:
//!
//! - `$U` tail number (padded with underscores)
//! - `$C` configuration, first field is the recorder model
//! - `$P` protocol version
//! - `$D,<flight>,<size in 16-bit words>` one per stored flight, in recording order
//! - `$L` last header line; binary flight data follows immediately
//!
//! Any other record kind (`$A` alarms, `$F` fuel, `$T` download time, ...) is
//! checksum-validated and otherwise ignored.

use serde::Serialize;
use tracing::trace;

use super::consts::{HEADER_CHECKSUM_SEP, HEADER_START, MAX_HEADER_LINE};
use super::error::DecodeError;

/// One `$D` directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub flight: u32,
    pub size_words: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogHeader {
    pub tail_number: Option<String>,
    pub model: Option<String>,
    pub protocol: Option<u32>,
    pub directory: Vec<DirectoryEntry>,
    /// Byte offset where binary flight data starts
    #[serde(skip)]
    pub data_offset: usize,
}

/// XOR of the bytes of a header line body (between `$` and `*`)
pub fn header_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

/// Parse the header block at the start of a log
pub fn parse_header(data: &[u8]) -> Result<LogHeader, DecodeError> {
    let mut header = LogHeader::default();
    let mut pos = 0;

    loop {
        if pos >= data.len() {
            return Err(DecodeError::MissingHeaderTerminator);
        }
        if data[pos] != HEADER_START {
            return Err(DecodeError::BadHeaderLine {
                offset: pos,
                reason: "line does not start with '$'",
            });
        }

        let window = &data[pos..data.len().min(pos + MAX_HEADER_LINE)];
        let newline = window
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(DecodeError::MissingHeaderTerminator)?;
        let mut line = &window[..newline];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        let line_start = pos;
        pos += newline + 1;

        let (kind, fields) = parse_line(line, line_start)?;
        trace!("header record ${} {:?}", kind, fields);

        match kind {
            "U" => {
                header.tail_number = fields
                    .first()
                    .map(|t| t.trim().trim_end_matches('_').to_string())
                    .filter(|t| !t.is_empty());
            }
            "C" => {
                header.model = fields
                    .first()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty());
            }
            "P" => {
                header.protocol = fields.first().and_then(|p| p.trim().parse().ok());
            }
            "D" => {
                let flight = parse_field(&fields, 0, line_start)?;
                let size_words = parse_field(&fields, 1, line_start)?;
                header.directory.push(DirectoryEntry { flight, size_words });
            }
            "L" => {
                header.data_offset = pos;
                return Ok(header);
            }
            _ => {}
        }
    }
}

/// Split a header line into its record kind and fields after checking its checksum
fn parse_line(line: &[u8], offset: usize) -> Result<(&str, Vec<&str>), DecodeError> {
    let text = std::str::from_utf8(line).map_err(|_| DecodeError::BadHeaderLine {
        offset,
        reason: "line is not ASCII",
    })?;

    let star = line
        .iter()
        .rposition(|&b| b == HEADER_CHECKSUM_SEP)
        .ok_or(DecodeError::BadHeaderLine {
            offset,
            reason: "missing '*' checksum separator",
        })?;

    let body = &text[1..star];
    let checksum_hex = text[star + 1..].trim();
    let expected = u8::from_str_radix(checksum_hex, 16).map_err(|_| DecodeError::BadHeaderLine {
        offset,
        reason: "checksum is not two hex digits",
    })?;
    let actual = header_checksum(body.as_bytes());
    if expected != actual {
        return Err(DecodeError::HeaderChecksum {
            offset,
            expected,
            actual,
        });
    }

    let mut parts = body.split(',');
    let kind = parts.next().unwrap_or_default().trim();
    if kind.is_empty() {
        return Err(DecodeError::BadHeaderLine {
            offset,
            reason: "empty record kind",
        });
    }
    Ok((kind, parts.collect()))
}

fn parse_field(fields: &[&str], index: usize, offset: usize) -> Result<u32, DecodeError> {
    fields
        .get(index)
        .and_then(|f| f.trim().parse::<u32>().ok())
        .ok_or(DecodeError::BadHeaderLine {
            offset,
            reason: "directory record needs numeric flight and size",
        })
}

/// Format one header line including checksum and CRLF
pub fn format_header_line(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, header_checksum(body.as_bytes()))
}
