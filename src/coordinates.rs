//! Coordinate codec for the engine monitor's GPS fields.
//!
//! The recorder writes positions as a hemisphere letter followed by
//! `DEG.MIN.HUNDREDTHS` (e.g. `N37.38.45`, `W122.05.88`). Some exports drop
//! the hundredths and write `DEG.MINUTES` (e.g. `N37.38`). Both are converted
//! to signed decimal degrees here.

/// Mean Earth radius used for great-circle distances, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Which axis a coordinate belongs to; selects the hemisphere letters on encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Parse a raw recorder coordinate into signed decimal degrees.
///
/// Returns `None` for anything malformed: empty or one-character input, a
/// missing directional prefix, fewer than two dot-separated parts, or
/// non-numeric / out-of-range components. South and west are negative.
///
/// Hemisphere letters are case-insensitive. `N`/`S` values are bounded by 90
/// degrees; any other alphabetic prefix is positive and bounded by 180.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let dir = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return None;
    }

    // A digit or sign in first position means the hemisphere letter is missing;
    // reading it as a prefix would shift every digit and produce a wrong value.
    if !dir.is_alphabetic() {
        return None;
    }

    let parts: Vec<&str> = rest.split('.').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let dir = dir.to_ascii_uppercase();
    let max_degrees = match dir {
        'N' | 'S' => 90.0,
        _ => 180.0,
    };

    let degrees = parse_unsigned(parts[0])?;

    let minutes = if parts.len() == 3 {
        let whole = parse_unsigned(parts[1])?;
        let hundredths = parse_unsigned(parts[2])?;
        if hundredths >= 100 {
            return None;
        }
        whole as f64 + hundredths as f64 / 100.0
    } else {
        let decimal = parts[1].trim();
        if decimal.is_empty() || !decimal.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        decimal.parse::<f64>().ok()?
    };

    if !minutes.is_finite() || minutes >= 60.0 {
        return None;
    }

    let decimal = degrees as f64 + minutes / 60.0;
    if decimal > max_degrees {
        return None;
    }
    let sign = match dir {
        'S' | 'W' => -1.0,
        _ => 1.0,
    };
    Some(sign * decimal)
}

fn parse_unsigned(s: &str) -> Option<u32> {
    let t = s.trim();
    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<u32>().ok()
}

/// Signed decimal degrees in the recorder's storage unit, hundredths of a minute
pub fn to_hundredths_of_minute(value: f64) -> i64 {
    (value * 6000.0).round() as i64
}

/// Render a stored hundredths-of-a-minute value, e.g. `-732588` -> `W122.05.88`
pub fn format_hundredths_of_minute(value: i64, axis: Axis) -> String {
    let hemisphere = match (axis, value < 0) {
        (Axis::Latitude, false) => 'N',
        (Axis::Latitude, true) => 'S',
        (Axis::Longitude, false) => 'E',
        (Axis::Longitude, true) => 'W',
    };
    let magnitude = value.unsigned_abs();
    format!(
        "{}{}.{:02}.{:02}",
        hemisphere,
        magnitude / 6000,
        (magnitude % 6000) / 100,
        magnitude % 100
    )
}

/// Encode signed decimal degrees in the recorder's `DEG.MIN.HUNDREDTHS` form.
///
/// Minutes are rounded to the nearest hundredth, which is the precision the
/// recorder stores. Example: `-122.098` on the longitude axis -> `W122.05.88`.
pub fn format_coordinate(value: f64, axis: Axis) -> String {
    format_hundredths_of_minute(to_hundredths_of_minute(value), axis)
}

/// Great-circle distance between two points in decimal degrees, in kilometres
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
