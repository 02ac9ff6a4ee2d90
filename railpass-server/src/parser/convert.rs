//! Conversion from raw records to validated legs.

use tracing::debug;

use crate::domain::{
    FareClass, Fares, JourneyLeg, LegParts, NO_TRAIN_NUMBER, Price, StationCode, SubSegment,
    TravelMode, infer_arrival_date, parse_clock, parse_iso_datetime,
};

use super::records::{ScrapedRow, StoredAmount, StoredJourneyOption, StoredSearch, StoredTravelLeg};
use super::{ParseError, SearchContext};

/// Largest count a segment label may claim.
pub const MAX_LABELLED_SEGMENTS: u32 = 16;

/// Number of segments described by a label such as `"2 Segments"`.
///
/// Anything without a usable leading count (`"Direct"`, empty, zero or more
/// than [`MAX_LABELLED_SEGMENTS`]) is one segment.
pub fn segment_count_from_label(label: &str) -> u32 {
    label
        .split_whitespace()
        .next()
        .and_then(|first| first.parse::<u32>().ok())
        .filter(|n| (1..=MAX_LABELLED_SEGMENTS).contains(n))
        .unwrap_or(1)
}

/// Convert one scraped result row.
///
/// Delayed rows are rejected before any price is looked at.
pub fn parse_scraped_row(row: &ScrapedRow, ctx: &SearchContext) -> Result<JourneyLeg, ParseError> {
    if row
        .delay_notice
        .as_deref()
        .is_some_and(|notice| !notice.trim().is_empty())
    {
        return Err(ParseError::Delayed);
    }

    let label = row
        .train_label
        .as_deref()
        .ok_or(ParseError::MissingField("train label"))?;
    let (train_id, name) = split_train_label(label);

    let fares = Fares {
        coach: scraped_price(row.coach.as_deref()),
        business: scraped_price(row.business.as_deref()),
        sleeper: scraped_price(row.sleeper.as_deref()),
    };
    if fares.is_sold_out() {
        return Err(ParseError::SoldOut);
    }

    let departure_time = row
        .departure_time
        .as_deref()
        .ok_or(ParseError::MissingField("departure time"))?;
    let departure = ctx.date.and_time(parse_clock(departure_time)?);

    let arrival_time = row
        .arrival_time
        .as_deref()
        .ok_or(ParseError::MissingField("arrival time"))?;
    let arrival_date = match row.arrival_day.as_deref() {
        Some(day) if !day.trim().is_empty() => infer_arrival_date(day, Some(ctx.date), ctx.today)?,
        _ => ctx.date,
    };
    let arrival = arrival_date.and_time(parse_clock(arrival_time)?);

    let segment_label = row
        .segment_label
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Direct")
        .to_string();
    let segment_count = segment_count_from_label(&segment_label);
    let sub_segments = if segment_count > 1 {
        vec![SubSegment::unknown(); segment_count as usize]
    } else {
        Vec::new()
    };

    let leg = JourneyLeg::new(LegParts {
        origin: ctx.origin,
        destination: ctx.destination,
        train_id,
        name,
        departure,
        arrival,
        elapsed: row.travel_time.clone().unwrap_or_default().trim().to_string(),
        fares,
        segment_count,
        segment_label,
        sub_segments,
        stops: Vec::new(),
    })?;
    Ok(leg)
}

/// Convert one option of the structured client-storage record.
pub fn parse_journey_option(
    option: &StoredJourneyOption,
    ctx: &SearchContext,
) -> Result<JourneyLeg, ParseError> {
    if option.is_delayed || option.is_cancelled {
        return Err(ParseError::Delayed);
    }

    let fares = stored_fares(option);
    if fares.is_sold_out() {
        return Err(ParseError::SoldOut);
    }

    let first = option
        .travel_legs
        .first()
        .ok_or(ParseError::MissingField("travelLegs"))?;
    let segment_count = option.travel_legs.len() as u32;

    let (train_id, name) = if segment_count == 1 {
        (
            first
                .service_number
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| NO_TRAIN_NUMBER.to_string()),
            first.service_name.clone().unwrap_or_else(|| "Train".to_string()),
        )
    } else {
        (NO_TRAIN_NUMBER.to_string(), multi_leg_name(&option.travel_legs))
    };

    let origin = match option.origin.as_deref() {
        Some(code) => StationCode::parse_normalized(code)?,
        None => ctx.origin,
    };
    let destination = match option.destination.as_deref() {
        Some(code) => StationCode::parse_normalized(code)?,
        None => ctx.destination,
    };

    let departure = parse_iso_datetime(
        option
            .departure_date_time
            .as_deref()
            .ok_or(ParseError::MissingField("departureDateTime"))?,
    )?;
    let arrival = parse_iso_datetime(
        option
            .arrival_date_time
            .as_deref()
            .ok_or(ParseError::MissingField("arrivalDateTime"))?,
    )?;

    let sub_segments = if segment_count > 1 {
        option.travel_legs.iter().map(sub_segment).collect()
    } else {
        Vec::new()
    };

    let stops = option
        .intermediate_stops
        .iter()
        .filter_map(|s| StationCode::parse_normalized(s).ok())
        .collect();

    let segment_label = if segment_count == 1 {
        "Direct".to_string()
    } else {
        format!("{segment_count} Segments")
    };

    let leg = JourneyLeg::new(LegParts {
        origin,
        destination,
        train_id,
        name,
        departure,
        arrival,
        elapsed: option.elapsed_time.clone().unwrap_or_default(),
        fares,
        segment_count,
        segment_label,
        sub_segments,
        stops,
    })?;
    Ok(leg)
}

/// Parse the structured record and convert every usable option.
///
/// Options that cannot be converted are logged and skipped; only a record
/// that is not valid JSON at all is an error.
pub fn parse_stored_search(json: &str, ctx: &SearchContext) -> Result<Vec<JourneyLeg>, ParseError> {
    let search: StoredSearch = serde_json::from_str(json)?;

    let mut legs = Vec::with_capacity(search.journey_options.len());
    for option in &search.journey_options {
        match parse_journey_option(option, ctx) {
            Ok(leg) => legs.push(leg),
            Err(e) => debug!(
                option = option.id.as_deref().unwrap_or("?"),
                reason = %e,
                "skipping journey option"
            ),
        }
    }
    Ok(legs)
}

fn split_train_label(label: &str) -> (String, String) {
    let lines: Vec<&str> = label
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [number, name, ..] => {
            let name = if *name == "NA" { "Train" } else { name };
            (number.to_string(), name.to_string())
        }
        [only] => (NO_TRAIN_NUMBER.to_string(), only.to_string()),
        [] => (NO_TRAIN_NUMBER.to_string(), "Train".to_string()),
    }
}

fn scraped_price(text: Option<&str>) -> Option<Price> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    match Price::parse(text) {
        Ok(price) => Some(price),
        Err(e) => {
            debug!(text, reason = %e, "ignoring unreadable price");
            None
        }
    }
}

fn stored_fares(option: &StoredJourneyOption) -> Fares {
    let mut fares = Fares::default();
    for fare in option.fares.iter().filter(|f| !f.sold_out) {
        let Some(class) = FareClass::from_label(&fare.fare_class) else {
            debug!(class = %fare.fare_class, "ignoring unknown fare class");
            continue;
        };
        let price = match &fare.amount {
            Some(StoredAmount::Number(n)) => Price::from_dollars(*n).ok(),
            Some(StoredAmount::Text(t)) => Price::parse(t).ok(),
            None => None,
        };
        if let Some(price) = price {
            fares.offer(class, price);
        }
    }
    fares
}

fn multi_leg_name(legs: &[StoredTravelLeg]) -> String {
    let modes: Vec<TravelMode> = legs.iter().map(travel_mode).collect();
    match modes.split_first() {
        Some((first, rest)) if rest.iter().all(|m| m == first) => {
            format!("Multiple {}", first.plural())
        }
        _ => "Mixed Service".to_string(),
    }
}

fn travel_mode(leg: &StoredTravelLeg) -> TravelMode {
    leg.service_type
        .as_deref()
        .map_or(TravelMode::Other, TravelMode::from_label)
}

fn sub_segment(leg: &StoredTravelLeg) -> SubSegment {
    SubSegment {
        number: leg
            .service_number
            .clone()
            .unwrap_or_else(|| NO_TRAIN_NUMBER.to_string()),
        name: leg.service_name.clone().unwrap_or_default(),
        mode: travel_mode(leg),
        operator: leg.operator.clone(),
        origin: leg
            .origin
            .as_deref()
            .and_then(|c| StationCode::parse_normalized(c).ok()),
        destination: leg
            .destination
            .as_deref()
            .and_then(|c| StationCode::parse_normalized(c).ok()),
        departure: leg
            .departure_date_time
            .as_deref()
            .and_then(|t| parse_iso_datetime(t).ok()),
        arrival: leg
            .arrival_date_time
            .as_deref()
            .and_then(|t| parse_iso_datetime(t).ok()),
        duration: leg.duration.clone(),
        amenities: leg.amenities.clone(),
        available_inventory: leg.available_inventory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{at, code};
    use crate::parser::StoredFare;
    use chrono::NaiveDate;

    fn ctx() -> SearchContext {
        SearchContext {
            origin: code("WAS"),
            destination: code("NYP"),
            date: NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
            today: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn row() -> ScrapedRow {
        ScrapedRow {
            train_label: Some("171\nNortheast Regional".into()),
            departure_time: Some("7:05a".into()),
            delay_notice: None,
            travel_time: Some("3h 25m".into()),
            segment_label: Some("Direct".into()),
            arrival_time: Some("10:30a".into()),
            arrival_day: None,
            coach: Some("$49".into()),
            business: Some("$89".into()),
            sleeper: None,
        }
    }

    fn travel_leg(number: &str, kind: &str) -> StoredTravelLeg {
        StoredTravelLeg {
            service_number: Some(number.into()),
            service_name: Some("Northeast Regional".into()),
            service_type: Some(kind.into()),
            operator: Some("Amtrak".into()),
            origin: Some("WAS".into()),
            destination: Some("NYP".into()),
            departure_date_time: Some("2024-03-29T07:05:00".into()),
            arrival_date_time: Some("2024-03-29T10:30:00".into()),
            duration: Some("3h 25m".into()),
            amenities: vec!["Cafe".into()],
            available_inventory: Some(12),
        }
    }

    fn option(legs: Vec<StoredTravelLeg>) -> StoredJourneyOption {
        StoredJourneyOption {
            id: Some("opt".into()),
            origin: Some("WAS".into()),
            destination: Some("NYP".into()),
            departure_date_time: Some("2024-03-29T07:05:00".into()),
            arrival_date_time: Some("2024-03-29T12:30:00".into()),
            elapsed_time: Some("5h 25m".into()),
            travel_legs: legs,
            fares: vec![StoredFare {
                fare_class: "COACH".into(),
                amount: Some(StoredAmount::Number(49.0)),
                sold_out: false,
            }],
            is_delayed: false,
            is_cancelled: false,
            intermediate_stops: vec!["BAL".into(), "phl".into(), "??".into()],
        }
    }

    #[test]
    fn segment_counts_from_labels() {
        assert_eq!(segment_count_from_label("Direct"), 1);
        assert_eq!(segment_count_from_label("2 Segments"), 2);
        assert_eq!(segment_count_from_label("3"), 3);
        assert_eq!(segment_count_from_label(""), 1);
        assert_eq!(segment_count_from_label("0 Segments"), 1);
        assert_eq!(segment_count_from_label("16 Segments"), 16);
        assert_eq!(segment_count_from_label("17 Segments"), 1);
        assert_eq!(segment_count_from_label("4000000000 Segments"), 1);
        assert_eq!(segment_count_from_label("99999999999 Segments"), 1);
    }

    #[test]
    fn scraped_absurd_segment_label_is_one_segment() {
        let mut r = row();
        r.segment_label = Some("4000000000 Segments".into());
        let leg = parse_scraped_row(&r, &ctx()).unwrap();
        assert_eq!(leg.segment_count(), 1);
        assert!(leg.sub_segments().is_empty());
        assert_eq!(leg.segment_label(), "4000000000 Segments");
    }

    #[test]
    fn scraped_named_train() {
        let leg = parse_scraped_row(&row(), &ctx()).unwrap();
        assert_eq!(leg.train_id(), "171");
        assert_eq!(leg.name(), "Northeast Regional");
        assert_eq!(leg.departure(), at(2024, 3, 29, 7, 5));
        assert_eq!(leg.arrival(), at(2024, 3, 29, 10, 30));
        assert_eq!(leg.fares().coach, Some(Price::from_cents(4_900)));
        assert_eq!(leg.fares().sleeper, None);
        assert_eq!(leg.segment_count(), 1);
        assert!(leg.sub_segments().is_empty());
    }

    #[test]
    fn scraped_na_name_becomes_train() {
        let mut r = row();
        r.train_label = Some("2150\nNA".into());
        let leg = parse_scraped_row(&r, &ctx()).unwrap();
        assert_eq!(leg.train_id(), "2150");
        assert_eq!(leg.name(), "Train");
    }

    #[test]
    fn scraped_multi_segment_gets_placeholders() {
        let mut r = row();
        r.train_label = Some("Mixed Service".into());
        r.segment_label = Some("2 Segments".into());
        let leg = parse_scraped_row(&r, &ctx()).unwrap();
        assert_eq!(leg.train_id(), NO_TRAIN_NUMBER);
        assert_eq!(leg.name(), "Mixed Service");
        assert_eq!(leg.segment_count(), 2);
        assert_eq!(leg.sub_segments().len(), 2);
    }

    #[test]
    fn scraped_overnight_arrival() {
        let mut r = row();
        r.departure_time = Some("9:00p".into());
        r.arrival_time = Some("6:10a".into());
        r.arrival_day = Some("Sat, Mar 30".into());
        let leg = parse_scraped_row(&r, &ctx()).unwrap();
        assert_eq!(leg.arrival(), at(2024, 3, 30, 6, 10));
    }

    #[test]
    fn scraped_new_year_overnight_is_kept() {
        let mut r = row();
        r.departure_time = Some("9:00p".into());
        r.arrival_time = Some("6:10a".into());
        r.arrival_day = Some("Wed, Jan 1".into());
        r.coach = Some("$49".into());
        let ctx = SearchContext {
            date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ..ctx()
        };
        let leg = parse_scraped_row(&r, &ctx).unwrap();
        assert_eq!(leg.departure(), at(2024, 12, 31, 21, 0));
        assert_eq!(leg.arrival(), at(2025, 1, 1, 6, 10));
    }

    #[test]
    fn scraped_sold_out_dropped() {
        let mut r = row();
        r.coach = None;
        r.business = Some("  ".into());
        r.sleeper = Some("Sold Out".into());
        assert!(matches!(
            parse_scraped_row(&r, &ctx()),
            Err(ParseError::SoldOut)
        ));
    }

    #[test]
    fn scraped_delay_checked_before_prices() {
        let mut r = row();
        r.delay_notice = Some("Delayed".into());
        r.coach = None;
        r.business = None;
        assert!(matches!(
            parse_scraped_row(&r, &ctx()),
            Err(ParseError::Delayed)
        ));
    }

    #[test]
    fn scraped_missing_times() {
        let mut r = row();
        r.departure_time = None;
        assert!(matches!(
            parse_scraped_row(&r, &ctx()),
            Err(ParseError::MissingField(_))
        ));

        let mut r = row();
        r.arrival_time = Some("noon".into());
        assert!(matches!(
            parse_scraped_row(&r, &ctx()),
            Err(ParseError::InvalidTime(_))
        ));
    }

    #[test]
    fn structured_single_leg() {
        let leg = parse_journey_option(&option(vec![travel_leg("171", "TRAIN")]), &ctx()).unwrap();
        assert_eq!(leg.train_id(), "171");
        assert_eq!(leg.segment_count(), 1);
        assert!(leg.sub_segments().is_empty());
        assert_eq!(leg.stops(), &[code("BAL"), code("PHL")]);
        assert_eq!(leg.segment_label(), "Direct");
    }

    #[test]
    fn structured_all_trains() {
        let opt = option(vec![travel_leg("171", "TRAIN"), travel_leg("93", "TRAIN")]);
        let leg = parse_journey_option(&opt, &ctx()).unwrap();
        assert_eq!(leg.train_id(), NO_TRAIN_NUMBER);
        assert_eq!(leg.name(), "Multiple Trains");
        assert_eq!(leg.segment_count(), 2);

        let details = leg.sub_segments();
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].number, "93");
        assert_eq!(details[0].operator.as_deref(), Some("Amtrak"));
        assert_eq!(details[0].amenities, vec!["Cafe".to_string()]);
        assert_eq!(details[0].available_inventory, Some(12));
    }

    #[test]
    fn structured_mixed_modes() {
        let opt = option(vec![travel_leg("171", "TRAIN"), travel_leg("5171", "BUS")]);
        let leg = parse_journey_option(&opt, &ctx()).unwrap();
        assert_eq!(leg.name(), "Mixed Service");
        assert_eq!(leg.sub_segments()[1].mode, TravelMode::Bus);
    }

    #[test]
    fn structured_rejections() {
        let mut delayed = option(vec![travel_leg("171", "TRAIN")]);
        delayed.is_cancelled = true;
        assert!(matches!(
            parse_journey_option(&delayed, &ctx()),
            Err(ParseError::Delayed)
        ));

        let mut sold_out = option(vec![travel_leg("171", "TRAIN")]);
        sold_out.fares = vec![StoredFare {
            fare_class: "COACH".into(),
            amount: Some(StoredAmount::Number(49.0)),
            sold_out: true,
        }];
        assert!(matches!(
            parse_journey_option(&sold_out, &ctx()),
            Err(ParseError::SoldOut)
        ));

        let no_legs = option(Vec::new());
        assert!(matches!(
            parse_journey_option(&no_legs, &ctx()),
            Err(ParseError::MissingField("travelLegs"))
        ));
    }

    #[test]
    fn stored_search_skips_bad_options() {
        let json = r#"{"journeyOptions":[
            {"id":"good","departureDateTime":"2024-03-29T07:05:00","arrivalDateTime":"2024-03-29T10:30:00",
             "travelLegs":[{"serviceNumber":"171","serviceName":"Northeast Regional","serviceType":"TRAIN"}],
             "fares":[{"fareClass":"COACH","amount":"$49.00"}]},
            {"id":"sold-out","departureDateTime":"2024-03-29T08:05:00","arrivalDateTime":"2024-03-29T11:30:00",
             "travelLegs":[{"serviceNumber":"173","serviceType":"TRAIN"}],
             "fares":[]}
        ]}"#;
        let legs = parse_stored_search(json, &ctx()).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].origin(), code("WAS"));
        assert_eq!(legs[0].fares().coach, Some(Price::from_cents(4_900)));
    }

    #[test]
    fn stored_search_rejects_garbage() {
        assert!(matches!(
            parse_stored_search("not json", &ctx()),
            Err(ParseError::Json(_))
        ));
    }
}
