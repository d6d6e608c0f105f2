//! Date-only serde adapters.
//!
//! The backend speaks ISO-8601 calendar dates (`YYYY-MM-DD`). Some
//! deployments echo full timestamps back, so parsing keeps only the
//! calendar part of anything that looks like `YYYY-MM-DDT...`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date-only string, tolerating a trailing time component.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = raw.trim();
    let date_part = match trimmed.char_indices().nth(10) {
        Some((idx, 'T')) | Some((idx, ' ')) => &trimmed[..idx],
        _ => trimmed,
    };
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
}

/// Format a date for the wire.
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `NaiveDate` as `YYYY-MM-DD`.
pub mod iso_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_date(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// `Option<NaiveDate>`; `null` and the empty string both read as `None`.
pub mod iso_date_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&format_date(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// Patch field for a nullable date: absent (`None`), explicit null
/// (`Some(None)`), or a value. Pair with `#[serde(default)]` and
/// `skip_serializing_if = "Option::is_none"`.
pub mod iso_date_patch {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<Option<NaiveDate>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(Some(d)) => serializer.serialize_str(&format_date(d)),
            _ => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<NaiveDate>>, D::Error> {
        super::iso_date_opt::deserialize(deserializer).map(Some)
    }
}

/// Patch field for a nullable value: a present key always yields `Some`,
/// so an explicit `null` becomes `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let date = parse_date("1815-12-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1815, 12, 10).unwrap());
    }

    #[test]
    fn test_parse_truncates_timestamp() {
        let date = parse_date("2024-01-01T00:00:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let date = parse_date("2024-03-05 10:30:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_date("tomorrow").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(format_date(&date), "2024-01-09");
    }
}
