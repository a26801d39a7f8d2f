//! Mapping between record lanes and sample-row fields.
//!
//! A data record carries one signed byte delta per lane. A field is made of one
//! to three lanes, low byte first; its value is `sum(lane[k] * 256^k)`. Only
//! the most significant lane may go negative.

use super::consts::{FLAG_GPS, FLAG_HOURS};
use crate::coordinates::{Axis, format_hundredths_of_minute};
use crate::samples::FieldTag;

/// How a field's integer value is written into a sample row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Integer,
    /// Stored in tenths (MAP in inHg, fuel flow in gph, volts)
    Tenths,
    /// Stored in hundredths (hour meters)
    Hundredths,
    /// Stored in hundredths of a minute of arc, signed
    Coordinate(Axis),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldLayout {
    pub tag: FieldTag,
    /// Lane indices, least significant first
    pub lanes: &'static [u8],
    pub render: Render,
    /// Flight flags that must be set for the field to be recorded (0 = always)
    pub requires: u32,
}

const fn field(tag: FieldTag, lanes: &'static [u8], render: Render, requires: u32) -> FieldLayout {
    FieldLayout {
        tag,
        lanes,
        render,
        requires,
    }
}

pub const FIELDS: &[FieldLayout] = &[
    field(FieldTag::E1, &[0, 48], Render::Integer, 0),
    field(FieldTag::E2, &[1, 49], Render::Integer, 0),
    field(FieldTag::E3, &[2, 50], Render::Integer, 0),
    field(FieldTag::E4, &[3, 51], Render::Integer, 0),
    field(FieldTag::E5, &[4, 52], Render::Integer, 0),
    field(FieldTag::E6, &[5, 53], Render::Integer, 0),
    field(FieldTag::Oat, &[6], Render::Integer, 0),
    field(FieldTag::C1, &[8], Render::Integer, 0),
    field(FieldTag::C2, &[9], Render::Integer, 0),
    field(FieldTag::C3, &[10], Render::Integer, 0),
    field(FieldTag::C4, &[11], Render::Integer, 0),
    field(FieldTag::C5, &[12], Render::Integer, 0),
    field(FieldTag::C6, &[13], Render::Integer, 0),
    field(FieldTag::OilTemp, &[14], Render::Integer, 0),
    field(FieldTag::OilPressure, &[15], Render::Integer, 0),
    field(FieldTag::ManifoldPressure, &[16], Render::Tenths, 0),
    field(FieldTag::Rpm, &[17, 18], Render::Integer, 0),
    field(FieldTag::FuelFlow, &[19], Render::Tenths, 0),
    field(FieldTag::Volts, &[20], Render::Tenths, 0),
    field(FieldTag::Speed, &[21], Render::Integer, 0),
    field(FieldTag::Alt, &[24, 25], Render::Integer, 0),
    field(FieldTag::Lat, &[32, 33, 34], Render::Coordinate(Axis::Latitude), FLAG_GPS),
    field(FieldTag::Lng, &[35, 36, 37], Render::Coordinate(Axis::Longitude), FLAG_GPS),
    field(FieldTag::Tach, &[40, 41, 42], Render::Hundredths, FLAG_HOURS),
    field(FieldTag::Hobbs, &[43, 44, 45], Render::Hundredths, FLAG_HOURS),
];

impl FieldLayout {
    pub fn recorded(&self, flight_flags: u32) -> bool {
        self.requires & flight_flags == self.requires
    }

    /// Combine lane accumulators into the field value
    pub fn value(&self, lanes: &[i64]) -> i64 {
        self.lanes
            .iter()
            .enumerate()
            .map(|(k, &lane)| lanes[lane as usize] << (8 * k))
            .sum()
    }

    /// Split a value into per-lane components.
    ///
    /// Lower lanes hold base-256 digits (0..=255); the top lane holds the
    /// signed remainder and must stay within -255..=255. Returns `None` when
    /// the value does not fit.
    pub fn split(&self, value: i64) -> Option<Vec<i64>> {
        let n = self.lanes.len();
        let base = 1i64 << (8 * (n - 1));
        let top = value.div_euclid(base);
        if top.abs() > 255 {
            return None;
        }
        let rest = value.rem_euclid(base);
        let mut parts: Vec<i64> = (0..n - 1).map(|k| (rest >> (8 * k)) & 0xff).collect();
        parts.push(top);
        Some(parts)
    }

    pub fn render(&self, value: i64) -> String {
        match self.render {
            Render::Integer => value.to_string(),
            Render::Tenths => format_scaled(value, 10),
            Render::Hundredths => format_scaled(value, 100),
            Render::Coordinate(axis) => format_hundredths_of_minute(value, axis),
        }
    }
}

pub fn layout(tag: FieldTag) -> Option<&'static FieldLayout> {
    FIELDS.iter().find(|f| f.tag == tag)
}

fn format_scaled(value: i64, scale: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let scale = scale as u64;
    let width = if scale == 10 { 1 } else { 2 };
    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / scale,
        magnitude % scale,
        width = width
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpi::consts::LANE_COUNT;
    use std::collections::HashSet;

    #[test]
    fn test_lanes_are_unique_and_in_range() {
        let mut seen = HashSet::new();
        for f in FIELDS {
            for &lane in f.lanes {
                assert!((lane as usize) < LANE_COUNT);
                assert!(seen.insert(lane), "lane {lane} used twice");
            }
        }
    }

    #[test]
    fn test_split_and_value_agree() {
        let lat = layout(FieldTag::Lat).unwrap();
        let mut lanes = vec![0i64; LANE_COUNT];
        for value in [0, 1, -1, 255, 256, 225_845, -733_188, 539_999, -1_080_000] {
            let parts = lat.split(value).unwrap();
            for (k, &lane) in lat.lanes.iter().enumerate() {
                lanes[lane as usize] = parts[k];
            }
            assert_eq!(lat.value(&lanes), value);
        }
    }

    #[test]
    fn test_split_rejects_overflow() {
        let alt = layout(FieldTag::Alt).unwrap();
        assert!(alt.split(65_535).is_some());
        assert!(alt.split(65_536).is_none());
        assert!(alt.split(-65_280).is_some());
        assert!(alt.split(-65_281).is_none());
    }

    #[test]
    fn test_render() {
        assert_eq!(layout(FieldTag::Tach).unwrap().render(123_456), "1234.56");
        assert_eq!(layout(FieldTag::Tach).unwrap().render(5), "0.05");
        assert_eq!(layout(FieldTag::FuelFlow).unwrap().render(105), "10.5");
        assert_eq!(layout(FieldTag::Oat).unwrap().render(-12), "-12");
        assert_eq!(layout(FieldTag::Lat).unwrap().render(225_845), "N37.38.45");
        assert_eq!(layout(FieldTag::Lng).unwrap().render(-732_588), "W122.05.88");
    }

    #[test]
    fn test_recorded_depends_on_flags() {
        let lat = layout(FieldTag::Lat).unwrap();
        assert!(!lat.recorded(0));
        assert!(lat.recorded(FLAG_GPS));
        assert!(layout(FieldTag::Alt).unwrap().recorded(0));
    }
}
