//! The shared, reversible date/range codec.
//!
//! The decode path is used by the ingest-side date handler; the encode path
//! is used by both output encoders. For every state reachable by [`decode`],
//! `encode(decode(x)) == x`. The unspecified-date compression transforms are
//! one-directional: [`DateParts::encode`] re-derives the compressed token
//! (e.g. `199X` for a full decade), but decode never re-expands one.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// A date-grammar mismatch. The date handler turns this into a warning and
/// leaves the field unset; it never fails a whole entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid date format '{value}'")]
pub struct DateError {
    pub value: String,
}

/// Season and quarter tokens, stored in place of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    Quarter1,
    Quarter2,
    Quarter3,
    Quarter4,
}

impl Season {
    /// The fixed season → numeric-code table (21..28).
    pub fn code(self) -> u8 {
        match self {
            Season::Spring => 21,
            Season::Summer => 22,
            Season::Autumn => 23,
            Season::Winter => 24,
            Season::Quarter1 => 25,
            Season::Quarter2 => 26,
            Season::Quarter3 => 27,
            Season::Quarter4 => 28,
        }
    }

    /// Inverse of [`Season::code`].
    pub fn from_code(code: u8) -> Option<Season> {
        match code {
            21 => Some(Season::Spring),
            22 => Some(Season::Summer),
            23 => Some(Season::Autumn),
            24 => Some(Season::Winter),
            25 => Some(Season::Quarter1),
            26 => Some(Season::Quarter2),
            27 => Some(Season::Quarter3),
            28 => Some(Season::Quarter4),
            _ => None,
        }
    }

    /// Parse a textual season/quarter token.
    pub fn from_token(token: &str) -> Option<Season> {
        match token.to_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "autumn" | "fall" => Some(Season::Autumn),
            "winter" => Some(Season::Winter),
            "q1" => Some(Season::Quarter1),
            "q2" => Some(Season::Quarter2),
            "q3" => Some(Season::Quarter3),
            "q4" => Some(Season::Quarter4),
            _ => None,
        }
    }
}

/// Unspecified-date compression kinds.
///
/// Each collapses a full range into a single wildcard token on encode:
/// `199X`, `19XX`, `1999-XX`, `1999-01-XX`, `1999-XX-XX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unspecified {
    YearInDecade,
    YearInCentury,
    MonthInYear,
    DayInMonth,
    DayInYear,
}

/// A structured date, possibly a range.
///
/// All components are stored as the digit strings that appeared in the
/// source, so zero padding survives a round trip. A date "exists" when
/// `year` is present. `end_year` distinguishes three cases: `None` means no
/// range at all, `Some("")` is an explicit open-ended range, and a non-empty
/// value is a closed range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateParts {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub season: Option<Season>,
    pub uncertain: bool,
    pub approximate: bool,
    pub unspecified: Option<Unspecified>,
    pub hour: Option<String>,
    pub minute: Option<String>,
    pub second: Option<String>,
    pub timezone: Option<String>,

    pub end_year: Option<String>,
    pub end_month: Option<String>,
    pub end_day: Option<String>,
    pub end_season: Option<Season>,
    pub end_uncertain: bool,
    pub end_approximate: bool,
    pub end_hour: Option<String>,
    pub end_minute: Option<String>,
    pub end_second: Option<String>,
    pub end_timezone: Option<String>,
}

// YEAR[-MONTH[-DAY]] optionally followed by "/" and a second (possibly
// empty) group.
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?(?:/(?:(\d{1,4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?)?)?$",
    )
    .unwrap()
});

impl DateParts {
    /// Whether any date is present at all.
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
    }

    /// Whether this date has an end side (including an open-ended one).
    pub fn has_end(&self) -> bool {
        self.end_year.is_some()
    }

    /// Decode a free-text date value.
    ///
    /// Accepts `YEAR[-MONTH[-DAY]]`, optionally followed by `/` and a second
    /// such group. An entirely empty second group is an intentionally
    /// open-ended range. Month values in the 21..28 season-code band are
    /// stored as seasons. Anything else is a [`DateError`].
    pub fn decode(value: &str) -> Result<DateParts, DateError> {
        let trimmed = value.trim();
        let caps = DATE_RE.captures(trimmed).ok_or_else(|| DateError {
            value: value.to_string(),
        })?;

        let mut parts = DateParts {
            year: caps.get(1).map(|m| m.as_str().to_string()),
            month: caps.get(2).map(|m| m.as_str().to_string()),
            day: caps.get(3).map(|m| m.as_str().to_string()),
            ..Default::default()
        };

        if trimmed.contains('/') {
            parts.end_year = Some(caps.get(4).map_or("", |m| m.as_str()).to_string());
            parts.end_month = caps.get(5).map(|m| m.as_str().to_string());
            parts.end_day = caps.get(6).map(|m| m.as_str().to_string());
        }

        // A month in the season-code band is a season, not a month.
        if let Some(season) = parts.month.as_deref().and_then(season_from_digits) {
            parts.month = None;
            parts.season = Some(season);
        }
        if let Some(season) = parts.end_month.as_deref().and_then(season_from_digits) {
            parts.end_month = None;
            parts.end_season = Some(season);
        }

        Ok(parts)
    }

    /// Encode this date back to its textual form.
    ///
    /// Applies unspecified-date compression first when flagged, then
    /// composes `year[-month[-day]]` with uncertainty/approximation markers
    /// (`?`, `~`, or `%` for both), an optional `T`-prefixed time, and a
    /// normalized timezone, mirrored on the end side when one is present.
    pub fn encode(mut self) -> String {
        self.compress();

        let mut out = compose_side(
            self.year.as_deref(),
            self.month.as_deref(),
            self.day.as_deref(),
            self.season,
            self.uncertain,
            self.approximate,
            self.hour.as_deref(),
            self.minute.as_deref(),
            self.second.as_deref(),
            self.timezone.as_deref(),
        );

        if let Some(end_year) = &self.end_year {
            out.push('/');
            if !end_year.is_empty() {
                out.push_str(&compose_side(
                    Some(end_year),
                    self.end_month.as_deref(),
                    self.end_day.as_deref(),
                    self.end_season,
                    self.end_uncertain,
                    self.end_approximate,
                    self.end_hour.as_deref(),
                    self.end_minute.as_deref(),
                    self.end_second.as_deref(),
                    self.end_timezone.as_deref(),
                ));
            }
        }

        out
    }

    /// This date with its end side cleared; used when the two sides of a
    /// range are rendered structurally instead of as one composed string.
    pub fn start_only(&self) -> DateParts {
        DateParts {
            end_year: None,
            end_month: None,
            end_day: None,
            end_season: None,
            end_uncertain: false,
            end_approximate: false,
            end_hour: None,
            end_minute: None,
            end_second: None,
            end_timezone: None,
            ..self.clone()
        }
    }

    /// The end side as a standalone date, when a non-empty end exists.
    pub fn end_only(&self) -> Option<DateParts> {
        let end_year = self.end_year.clone().filter(|y| !y.is_empty())?;
        Some(DateParts {
            year: Some(end_year),
            month: self.end_month.clone(),
            day: self.end_day.clone(),
            season: self.end_season,
            uncertain: self.end_uncertain,
            approximate: self.end_approximate,
            hour: self.end_hour.clone(),
            minute: self.end_minute.clone(),
            second: self.end_second.clone(),
            timezone: self.end_timezone.clone(),
            ..Default::default()
        })
    }

    /// Re-derive the compressed wildcard token for an unspecified date and
    /// drop the now-redundant end fields. Overrides season-derived values.
    fn compress(&mut self) {
        let Some(kind) = self.unspecified else {
            return;
        };

        match kind {
            Unspecified::YearInDecade => {
                if let Some(year) = self.year.take() {
                    let keep = year.len().saturating_sub(1);
                    self.year = Some(format!("{}X", &year[..keep]));
                }
                self.month = None;
                self.day = None;
            }
            Unspecified::YearInCentury => {
                if let Some(year) = self.year.take() {
                    let keep = year.len().saturating_sub(2);
                    self.year = Some(format!("{}XX", &year[..keep]));
                }
                self.month = None;
                self.day = None;
            }
            Unspecified::MonthInYear => {
                self.month = Some("XX".to_string());
                self.day = None;
            }
            Unspecified::DayInMonth => {
                self.day = Some("XX".to_string());
            }
            Unspecified::DayInYear => {
                self.month = Some("XX".to_string());
                self.day = Some("XX".to_string());
            }
        }

        self.season = None;
        self.end_year = None;
        self.end_month = None;
        self.end_day = None;
        self.end_season = None;
        self.end_uncertain = false;
        self.end_approximate = false;
        self.end_hour = None;
        self.end_minute = None;
        self.end_second = None;
        self.end_timezone = None;
    }
}

fn season_from_digits(digits: &str) -> Option<Season> {
    digits.parse::<u8>().ok().and_then(Season::from_code)
}

fn compose_side(
    year: Option<&str>,
    month: Option<&str>,
    day: Option<&str>,
    season: Option<Season>,
    uncertain: bool,
    approximate: bool,
    hour: Option<&str>,
    minute: Option<&str>,
    second: Option<&str>,
    timezone: Option<&str>,
) -> String {
    let mut out = String::new();
    let Some(year) = year else {
        return out;
    };
    out.push_str(year);

    // A season token stands in for the month via the fixed code table.
    let month_token = month
        .map(str::to_string)
        .or_else(|| season.map(|s| s.code().to_string()));

    if let Some(month) = month_token {
        out.push('-');
        out.push_str(&month);
        if let Some(day) = day {
            out.push('-');
            out.push_str(day);
        }
    }

    match (uncertain, approximate) {
        (true, true) => out.push('%'),
        (true, false) => out.push('?'),
        (false, true) => out.push('~'),
        (false, false) => {}
    }

    // Time only when an hour exists; minute and second are then mandatory.
    if let Some(hour) = hour {
        out.push('T');
        out.push_str(hour);
        out.push(':');
        out.push_str(minute.unwrap_or("00"));
        out.push(':');
        out.push_str(second.unwrap_or("00"));
        if let Some(tz) = timezone {
            out.push_str(&normalize_timezone(tz));
        }
    }

    out
}

fn normalize_timezone(tz: &str) -> String {
    let trimmed = tz.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        "Z".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &str) {
        let parts = DateParts::decode(input).unwrap();
        assert_eq!(parts.encode(), input, "round trip of {:?}", input);
    }

    #[test]
    fn test_decode_year_only() {
        let parts = DateParts::decode("1999").unwrap();
        assert_eq!(parts.year.as_deref(), Some("1999"));
        assert!(parts.month.is_none());
        assert!(!parts.has_end());
    }

    #[test]
    fn test_decode_full_date() {
        let parts = DateParts::decode("1999-04-02").unwrap();
        assert_eq!(parts.month.as_deref(), Some("04"));
        assert_eq!(parts.day.as_deref(), Some("02"));
    }

    #[test]
    fn test_decode_closed_range() {
        let parts = DateParts::decode("1999-04/2000-05").unwrap();
        assert_eq!(parts.end_year.as_deref(), Some("2000"));
        assert_eq!(parts.end_month.as_deref(), Some("05"));
    }

    #[test]
    fn test_decode_open_range() {
        let parts = DateParts::decode("2000/").unwrap();
        assert_eq!(parts.end_year.as_deref(), Some(""));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(DateParts::decode("circa 1999").is_err());
        assert!(DateParts::decode("1999-04-02-06").is_err());
        assert!(DateParts::decode("").is_err());
    }

    #[test]
    fn test_decode_season_code_band() {
        let parts = DateParts::decode("1999-21").unwrap();
        assert_eq!(parts.season, Some(Season::Spring));
        assert!(parts.month.is_none());
    }

    #[test]
    fn test_round_trips() {
        round_trip("1999");
        round_trip("1999-04");
        round_trip("1999-04-02");
        round_trip("1999/2000");
        round_trip("1999-04/2000-05");
        round_trip("1999-04-02/1999-04-10");
        round_trip("2000/");
        round_trip("1999-21");
        round_trip("1999-21/1999-24");
        round_trip("3-07-29");
    }

    #[test]
    fn test_markers() {
        let mut parts = DateParts::decode("1999").unwrap();
        parts.uncertain = true;
        assert_eq!(parts.clone().encode(), "1999?");
        parts.approximate = true;
        assert_eq!(parts.clone().encode(), "1999%");
        parts.uncertain = false;
        assert_eq!(parts.encode(), "1999~");
    }

    #[test]
    fn test_end_side_markers() {
        let mut parts = DateParts::decode("1999/2000").unwrap();
        parts.end_uncertain = true;
        assert_eq!(parts.encode(), "1999/2000?");
    }

    #[test]
    fn test_time_component() {
        let mut parts = DateParts::decode("1999-04-02").unwrap();
        parts.hour = Some("14".to_string());
        parts.minute = Some("30".to_string());
        parts.second = Some("05".to_string());
        assert_eq!(parts.clone().encode(), "1999-04-02T14:30:05");

        parts.timezone = Some("utc".to_string());
        assert_eq!(parts.encode(), "1999-04-02T14:30:05Z");
    }

    #[test]
    fn test_time_requires_hour() {
        let mut parts = DateParts::decode("1999").unwrap();
        parts.minute = Some("30".to_string());
        assert_eq!(parts.encode(), "1999");
    }

    #[test]
    fn test_year_in_decade_compression() {
        let parts = DateParts {
            year: Some("1990".to_string()),
            end_year: Some("1999".to_string()),
            unspecified: Some(Unspecified::YearInDecade),
            ..Default::default()
        };
        assert_eq!(parts.encode(), "199X");
    }

    #[test]
    fn test_year_in_century_compression() {
        let parts = DateParts {
            year: Some("1900".to_string()),
            end_year: Some("1999".to_string()),
            unspecified: Some(Unspecified::YearInCentury),
            ..Default::default()
        };
        assert_eq!(parts.encode(), "19XX");
    }

    #[test]
    fn test_day_in_year_compression_overrides_season() {
        let parts = DateParts {
            year: Some("1999".to_string()),
            season: Some(Season::Winter),
            end_year: Some("1999".to_string()),
            end_month: Some("12".to_string()),
            unspecified: Some(Unspecified::DayInYear),
            ..Default::default()
        };
        assert_eq!(parts.encode(), "1999-XX-XX");
    }

    #[test]
    fn test_month_in_year_compression() {
        let parts = DateParts {
            year: Some("1999".to_string()),
            month: Some("01".to_string()),
            end_year: Some("1999".to_string()),
            end_month: Some("12".to_string()),
            unspecified: Some(Unspecified::MonthInYear),
            ..Default::default()
        };
        assert_eq!(parts.encode(), "1999-XX");
    }

    #[test]
    fn test_day_in_month_compression() {
        let parts = DateParts {
            year: Some("1999".to_string()),
            month: Some("01".to_string()),
            day: Some("01".to_string()),
            end_year: Some("1999".to_string()),
            end_month: Some("01".to_string()),
            end_day: Some("31".to_string()),
            unspecified: Some(Unspecified::DayInMonth),
            ..Default::default()
        };
        assert_eq!(parts.encode(), "1999-01-XX");
    }

    #[test]
    fn test_compression_is_one_directional() {
        // Decode never re-expands a wildcard token.
        assert!(DateParts::decode("199X").is_err());
    }
}
