//! Fixture logs for integration tests, written with the crate's own encoder.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use jpi_logbook::jpi::{FlightRecording, LogBuilder, SampleValues};
use jpi_logbook::samples::FieldTag;

pub const PAO: (f64, f64) = (37.4611, -122.115);
pub const SMF: (f64, f64) = (38.6953, -121.5908);
pub const LVK: (f64, f64) = (37.6934, -121.822);

pub fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hh, mm, ss)
        .unwrap()
}

/// One recorded flight with linearly interpolated position and hour meters
pub struct Leg {
    pub number: u32,
    pub start: NaiveDateTime,
    pub interval_secs: u32,
    pub samples: usize,
    pub route: Option<((f64, f64), (f64, f64))>,
    pub tach: (f64, f64),
    pub hobbs: (f64, f64),
}

impl Leg {
    pub fn recording(&self) -> FlightRecording {
        let last = (self.samples - 1).max(1) as f64;
        let lerp = |(a, b): (f64, f64), i: usize| a + (b - a) * i as f64 / last;

        let mut recording = FlightRecording::new(self.number, self.start, self.interval_secs);
        for i in 0..self.samples {
            let climb = (i as i64 * 500).min(5500).min((self.samples - 1 - i) as i64 * 500);
            let mut sample = SampleValues::new()
                .with(FieldTag::Alt, 60 + climb)
                .with(FieldTag::Rpm, if i == 0 { 1000 } else { 2400 })
                .with(FieldTag::Oat, 18)
                .with_hours(lerp(self.tach, i), lerp(self.hobbs, i));
            if let Some((from, to)) = self.route {
                sample = sample.with_position(
                    lerp((from.0, to.0), i),
                    lerp((from.1, to.1), i),
                );
            }
            recording = recording.sample(sample);
        }
        recording
    }
}

/// PAO to SMF, SMF to LVK, then a local flight without GPS the next morning
pub fn trip_legs() -> Vec<Leg> {
    vec![
        Leg {
            number: 101,
            start: at(2021, 6, 10, 14, 30, 0),
            interval_secs: 60,
            samples: 31,
            route: Some((PAO, SMF)),
            tach: (1000.0, 1000.5),
            hobbs: (2000.0, 2000.6),
        },
        Leg {
            number: 102,
            start: at(2021, 6, 10, 16, 10, 0),
            interval_secs: 60,
            samples: 40,
            route: Some((SMF, LVK)),
            tach: (1000.5, 1001.2),
            hobbs: (2000.6, 2001.4),
        },
        Leg {
            number: 103,
            start: at(2021, 6, 11, 9, 0, 0),
            interval_secs: 120,
            samples: 10,
            route: None,
            tach: (1001.2, 1001.5),
            hobbs: (2001.4, 2001.8),
        },
    ]
}

pub fn trip_log() -> Vec<u8> {
    trip_legs()
        .iter()
        .fold(LogBuilder::new("N12345"), |b, leg| b.flight(leg.recording()))
        .build()
        .unwrap()
}

pub fn empty_log() -> Vec<u8> {
    LogBuilder::new("N12345").build().unwrap()
}
