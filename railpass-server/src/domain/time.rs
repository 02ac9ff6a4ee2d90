//! Date and time handling for booking-site values.
//!
//! The search form takes dates as `MM/DD/YYYY`. Result pages render times as
//! `5:30p` and, for overnight legs, give the arrival day as `Sun, Dec 1` with
//! no year. Client storage uses ISO-8601 timestamps.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Format used by the search form's date field.
pub const SEARCH_DATE_FORMAT: &str = "%m/%d/%Y";

/// Error returned when parsing an invalid date or time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a search date in `MM/DD/YYYY` form.
///
/// # Examples
///
/// ```
/// use railpass_server::domain::parse_search_date;
/// use chrono::NaiveDate;
///
/// let date = parse_search_date("03/29/2024").unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
///
/// assert!(parse_search_date("2024-03-29").is_err());
/// assert!(parse_search_date("13/01/2024").is_err());
/// ```
pub fn parse_search_date(s: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(s.trim(), SEARCH_DATE_FORMAT)
        .map_err(|_| TimeError::new("expected MM/DD/YYYY"))
}

/// Format a date for the search form's date field.
pub fn format_search_date(date: NaiveDate) -> String {
    date.format(SEARCH_DATE_FORMAT).to_string()
}

/// Parse a clock time as rendered on the results page.
///
/// Accepts the compact `5:30p` / `11:05a` form, the spelled-out
/// `05:30 PM` form, and 24-hour `17:30`.
pub fn parse_clock(s: &str) -> Result<NaiveTime, TimeError> {
    let mut compact: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if compact.ends_with('A') || compact.ends_with('P') {
        compact.push('M');
    }

    NaiveTime::parse_from_str(&compact, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(&compact, "%H:%M"))
        .map_err(|_| TimeError::new("expected a clock time like 5:30p"))
}

/// Work out the calendar date of an arrival.
///
/// The results page gives arrival days as `Sun, Dec 1` without a year. The
/// year is taken from the departure date when known, otherwise from `today`.
/// Full `MM/DD/YYYY` dates are also accepted unchanged.
///
/// If the day would fall before the departure date the year is bumped once,
/// so a leg leaving on 31 December arrives in January of the next year.
pub fn infer_arrival_date(
    text: &str,
    departure: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate, TimeError> {
    let text = text.trim();
    if text.is_empty() {
        return departure.ok_or(TimeError::new("empty arrival day"));
    }

    if let Ok(date) = parse_search_date(text) {
        return Ok(date);
    }

    // Drop the weekday: "Sun, Dec 1" -> "Dec 1"
    let month_day = match text.split_once(',') {
        Some((_, rest)) => rest,
        None => text,
    };
    let month_day = month_day.replace('.', "");

    let month_day = month_day.trim();
    let year = departure.map_or(today.year(), |d| d.year());
    let on_year = |year: i32| NaiveDate::parse_from_str(&format!("{month_day} {year}"), "%b %d %Y");
    let arrival =
        on_year(year).map_err(|_| TimeError::new("expected an arrival day like Sun, Dec 1"))?;

    match departure {
        Some(departure) if arrival < departure => on_year(year + 1)
            .map_err(|_| TimeError::new("arrival day does not exist in the following year")),
        _ => Ok(arrival),
    }
}

/// Parse an ISO-8601 timestamp from client storage.
///
/// Offsets are dropped: the local wall-clock time is what travellers see.
pub fn parse_iso_datetime(s: &str) -> Result<NaiveDateTime, TimeError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| TimeError::new("expected an ISO-8601 timestamp"))
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Render departure and arrival for display.
///
/// Same-day legs show only the times (`06:10AM`); legs spanning days show the
/// weekday and ordinal day as well (`Sun. 1st 06:10AM`).
pub fn pretty_pair(departure: NaiveDateTime, arrival: NaiveDateTime) -> (String, String) {
    if departure.date() == arrival.date() {
        (
            departure.format("%I:%M%p").to_string(),
            arrival.format("%I:%M%p").to_string(),
        )
    } else {
        (pretty_with_day(departure), pretty_with_day(arrival))
    }
}

fn pretty_with_day(dt: NaiveDateTime) -> String {
    format!(
        "{}. {}{} {}",
        dt.format("%a"),
        dt.day(),
        ordinal_suffix(dt.day()),
        dt.format("%I:%M%p")
    )
}
