use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const MONTH_DAY: &[BorrowedFormatItem<'_>] = format_description!("[month]/[day]");

/// Calendar date used for trade-log keys and signal-date comparison.
///
/// Ledger keys and signal comparison both use the zero-padded `MM/DD`
/// rendering because that is the form the signal site publishes; the ISO
/// rendering is for display and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// Parse a `YYYY-MM-DD` date string.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input, ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub fn from_date(value: Date) -> Self {
        Self(value)
    }

    /// The date `days` calendar days earlier.
    pub fn days_before(self, days: i64) -> Self {
        Self(self.0 - time::Duration::days(days))
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    /// Zero-padded `MM/DD` rendering, matching the signal site's date text.
    pub fn display_md(self) -> String {
        self.0
            .format(MONTH_DAY)
            .expect("TradeDate must be MM/DD formattable")
    }

    /// ISO `YYYY-MM-DD` rendering.
    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_DATE)
            .expect("TradeDate must be ISO formattable")
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
