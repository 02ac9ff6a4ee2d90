//! Fares per accommodation class.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid price.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid price: {reason}")]
pub struct InvalidPrice {
    reason: &'static str,
}

/// A ticket price in US cents.
///
/// # Examples
///
/// ```
/// use railpass_server::domain::Price;
///
/// let p = Price::parse("$1,234.50").unwrap();
/// assert_eq!(p.cents(), 123_450);
/// assert_eq!(p.to_string(), "$1,234.50");
/// assert_eq!(Price::parse("$49").unwrap().to_string(), "$49.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u32);

impl Price {
    pub fn from_cents(cents: u32) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u32 {
        self.0
    }

    /// Parse a displayed amount such as `$49`, `$1,234.50` or `49.5`.
    pub fn parse(s: &str) -> Result<Self, InvalidPrice> {
        let digits: String = s
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();

        if digits.is_empty() {
            return Err(InvalidPrice {
                reason: "empty amount",
            });
        }

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits.as_str(), ""),
        };

        if whole.is_empty() || frac.len() > 2 {
            return Err(InvalidPrice {
                reason: "expected dollars with at most two decimal places",
            });
        }

        let dollars: u32 = whole.parse().map_err(|_| InvalidPrice {
            reason: "dollars must be digits",
        })?;
        let cents: u32 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<2}");
            padded.parse().map_err(|_| InvalidPrice {
                reason: "cents must be digits",
            })?
        };

        dollars
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Price)
            .ok_or(InvalidPrice {
                reason: "amount too large",
            })
    }

    /// Convert a numeric dollar amount from client storage.
    pub fn from_dollars(amount: f64) -> Result<Self, InvalidPrice> {
        if !amount.is_finite() || amount < 0.0 || amount > f64::from(u32::MAX) / 100.0 {
            return Err(InvalidPrice {
                reason: "amount out of range",
            });
        }
        Ok(Price((amount * 100.0).round() as u32))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = self.0 % 100;

        let plain = dollars.to_string();
        let mut grouped = String::with_capacity(plain.len() + plain.len() / 3);
        for (i, ch) in plain.chars().enumerate() {
            if i > 0 && (plain.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "${grouped}.{cents:02}")
    }
}

/// Accommodation class offered on a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FareClass {
    Coach,
    Business,
    Sleeper,
}

impl FareClass {
    pub const ALL: [FareClass; 3] = [FareClass::Coach, FareClass::Business, FareClass::Sleeper];

    /// Match a class label from client storage (`"COACH"`, `"Business Class"`, `"Sleeper"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_ascii_lowercase();
        if lower.contains("coach") {
            Some(FareClass::Coach)
        } else if lower.contains("business") {
            Some(FareClass::Business)
        } else if lower.contains("sleeper") || lower.contains("room") {
            Some(FareClass::Sleeper)
        } else {
            None
        }
    }

    /// Name used in page element identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            FareClass::Coach => "coach",
            FareClass::Business => "business",
            FareClass::Sleeper => "sleeper",
        }
    }
}

/// Lowest price per class; `None` means the class is unavailable or sold out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fares {
    pub coach: Option<Price>,
    pub business: Option<Price>,
    pub sleeper: Option<Price>,
}

impl Fares {
    pub fn get(&self, class: FareClass) -> Option<Price> {
        match class {
            FareClass::Coach => self.coach,
            FareClass::Business => self.business,
            FareClass::Sleeper => self.sleeper,
        }
    }

    /// Record a price, keeping the cheaper one if the class already has a price.
    pub fn offer(&mut self, class: FareClass, price: Price) {
        let slot = match class {
            FareClass::Coach => &mut self.coach,
            FareClass::Business => &mut self.business,
            FareClass::Sleeper => &mut self.sleeper,
        };
        *slot = Some(slot.map_or(price, |existing| existing.min(price)));
    }

    /// A leg is sold out when no class has a price.
    pub fn is_sold_out(&self) -> bool {
        self.coach.is_none() && self.business.is_none() && self.sleeper.is_none()
    }
}
