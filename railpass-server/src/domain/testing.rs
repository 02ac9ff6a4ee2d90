//! Leg builders shared by unit tests.

use chrono::{NaiveDate, NaiveDateTime};

use super::{Fares, JourneyLeg, LegParts, NO_TRAIN_NUMBER, Price, ResultSet, StationCode, SubSegment};

pub fn code(s: &str) -> StationCode {
    StationCode::parse(s).unwrap()
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// A priced leg between two stations with the given width.
pub fn leg_between(
    origin: &str,
    destination: &str,
    train_id: &str,
    departure: NaiveDateTime,
    width: u32,
) -> JourneyLeg {
    let (train_id, sub_segments) = if width > 1 {
        (
            NO_TRAIN_NUMBER.to_string(),
            vec![SubSegment::unknown(); width as usize],
        )
    } else {
        (train_id.to_string(), Vec::new())
    };
    JourneyLeg::new(LegParts {
        origin: code(origin),
        destination: code(destination),
        train_id,
        name: "Northeast Regional".into(),
        departure,
        arrival: departure + chrono::Duration::hours(3),
        elapsed: "3h 0m".into(),
        fares: Fares {
            coach: Some(Price::from_cents(4_900)),
            business: None,
            sleeper: None,
        },
        segment_count: width,
        segment_label: if width > 1 {
            format!("{width} Segments")
        } else {
            "Direct".into()
        },
        sub_segments,
        stops: Vec::new(),
    })
    .unwrap()
}

/// A WAS to NYP leg departing on 29 March 2024 at `hour`:00.
pub fn leg(train_id: &str, hour: u32, width: u32) -> JourneyLeg {
    leg_between("WAS", "NYP", train_id, at(2024, 3, 29, hour, 0), width)
}

/// Results keyed 0.. in the given order.
pub fn results(legs: Vec<JourneyLeg>) -> ResultSet {
    legs.into_iter().enumerate().collect()
}
