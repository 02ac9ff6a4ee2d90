//! Booking-site station codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A string that is not a station code, with the text that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{input:?} is not a station code: {reason}")]
pub struct InvalidStationCode {
    input: String,
    reason: &'static str,
}

impl InvalidStationCode {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// The three capital letters the booking site keys stations by.
///
/// The directory and the search form both identify a station this way, and
/// a stored itinerary holds nothing else about where a leg starts or ends.
///
/// ```
/// use railpass_server::domain::StationCode;
///
/// let chicago = StationCode::parse("CHI").unwrap();
/// assert_eq!(chicago.to_string(), "CHI");
///
/// // Form input is forgiving, stored data is not
/// assert_eq!(StationCode::parse_normalized("chi\n").unwrap(), chicago);
/// assert!(StationCode::parse("chi").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode([u8; 3]);

impl StationCode {
    /// Accept exactly three letters `A`-`Z`, nothing else.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let letters: [u8; 3] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidStationCode::new(s, "expected three letters"))?;
        if !letters.iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidStationCode::new(s, "expected capital letters A-Z"));
        }
        Ok(Self(letters))
    }

    /// Like [`StationCode::parse`], after trimming and uppercasing.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StationCode {
    type Error = InvalidStationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationCode> for String {
    fn from(code: StationCode) -> Self {
        code.as_str().to_string()
    }
}
