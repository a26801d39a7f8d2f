/// Header line prefix and checksum separator
pub const HEADER_START: u8 = b'$';
pub const HEADER_CHECKSUM_SEP: u8 = b'*';

/// Longest header line accepted before giving up on finding its terminator
pub const MAX_HEADER_LINE: usize = 256;

/// Flight header: number u16, flags u32, interval u16, date u16, time u16, checksum u8
pub const FLIGHT_HEADER_SIZE: usize = 13;

/// Data records carry up to 16 field-flag bytes of 8 lanes each
pub const FIELD_FLAG_BYTES: usize = 16;
pub const LANE_COUNT: usize = FIELD_FLAG_BYTES * 8;

/// Flight flag: GPS latitude/longitude lanes are recorded
pub const FLAG_GPS: u32 = 0x0000_0001;
/// Flight flag: tach and Hobbs hour meter lanes are recorded
pub const FLAG_HOURS: u32 = 0x0000_0002;

/// Packed dates count years from this base
pub const YEAR_BASE: i32 = 2000;

/// Most samples a single flight may expand to, repeats included
pub const MAX_FLIGHT_SAMPLES: usize = 100_000;
