use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("header has no $L terminator line")]
    MissingHeaderTerminator,
    #[error("malformed header line at byte {offset}: {reason}")]
    BadHeaderLine { offset: usize, reason: &'static str },
    #[error("header checksum mismatch at byte {offset}: expected {expected:02X}, computed {actual:02X}")]
    HeaderChecksum {
        offset: usize,
        expected: u8,
        actual: u8,
    },
    #[error("flight {0} is not in the log")]
    FlightNotFound(u32),
    #[error("flight data at offset {offset} claims number {found}, directory says {expected}")]
    FlightNumberMismatch {
        offset: usize,
        expected: u32,
        found: u32,
    },
    #[error("unexpected end of data at byte {0}")]
    UnexpectedEof(usize),
    #[error("flight header checksum mismatch at byte {0}")]
    FlightHeaderChecksum(usize),
    #[error("flight {flight} has an invalid start timestamp (date word {date:#06x}, time word {time:#06x})")]
    InvalidTimestamp { flight: u32, date: u16, time: u16 },
    #[error("flight {0} has a zero sample interval")]
    InvalidInterval(u32),
    #[error("flight {flight} expands to more than {limit} samples")]
    TooManySamples { flight: u32, limit: usize },
    #[error("corrupt data record at byte {offset}: {reason}")]
    CorruptRecord { offset: usize, reason: &'static str },
}
