//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{BlogError, Result};

/// Lowercase month abbreviations used by Brazilian Portuguese
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Formats publication timestamps as `DD mmm YYYY` in pt-BR
///
/// # Examples
/// ```ignore
/// DateFormatter::default().format("2022-03-05T00:00:00Z") // -> "05 mar 2022"
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    timezone: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl DateFormatter {
    /// Create a formatter that reads the calendar day in `timezone`
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Create a formatter from an IANA timezone name (empty means UTC)
    pub fn from_timezone_name(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Ok(Self::default());
        }
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| BlogError::Config(format!("Unknown timezone: {}", name)))
    }

    /// Format a timestamp; fails on anything that does not parse as a date
    pub fn format(&self, timestamp: &str) -> Result<String> {
        let local = parse_timestamp(timestamp)?.with_timezone(&self.timezone);
        Ok(format!(
            "{:02} {} {:04}",
            local.day(),
            MONTHS_PT_BR[local.month0() as usize],
            local.year()
        ))
    }

    /// Format an optional timestamp; an absent one renders as the empty string
    pub fn format_optional(&self, timestamp: Option<&str>) -> Result<String> {
        match timestamp {
            Some(timestamp) => self.format(timestamp),
            None => Ok(String::new()),
        }
    }
}

/// Parse the timestamp shapes the content API emits
///
/// Accepts RFC 3339 (`2022-03-05T00:00:00Z`), offsets without a colon
/// (`2021-03-25T19:25:28+0000`) and bare dates (`2022-03-05`, read as UTC midnight).
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date);
    }
    if let Ok(date) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight).fixed_offset());
        }
    }

    Err(BlogError::format(value))
}
