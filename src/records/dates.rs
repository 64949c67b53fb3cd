//! Normalizes the collection-date column of a monitoring table into calendar dates.
//!
//! Sources arrive either with a native date/datetime column (Parquet, or CSV with
//! parsed dates) or with free text. Text is parsed row by row so a single bad cell
//! only loses its own row.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Formats tried, in order, for full date-time strings.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Formats tried, in order, for date-only strings. Day-first matches the
/// monitoring programme's locale.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parses a single date cell. Time-of-day is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }
    None
}

/// Converts any supported date representation into one optional `NaiveDate` per row.
pub(crate) fn normalize_date_column(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
    match column.dtype() {
        DataType::Date => Ok(column.date()?.as_date_iter().collect()),
        DataType::Datetime(_, _) => {
            let as_date = column.cast(&DataType::Date)?;
            Ok(as_date.date()?.as_date_iter().collect())
        }
        _ => {
            let as_text = column.cast(&DataType::String)?;
            Ok(as_text
                .str()?
                .into_iter()
                .map(|cell| cell.and_then(parse_date))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_dates_and_datetimes() {
        assert_eq!(parse_date("2025-09-29"), Some(ymd(2025, 9, 29)));
        assert_eq!(parse_date("2025-09-29 10:45:00"), Some(ymd(2025, 9, 29)));
        assert_eq!(parse_date("2025-09-29T10:45:00.123"), Some(ymd(2025, 9, 29)));
        assert_eq!(parse_date("  2025-09-29  "), Some(ymd(2025, 9, 29)));
    }

    #[test]
    fn parses_day_first_dates() {
        assert_eq!(parse_date("03/02/2025"), Some(ymd(2025, 2, 3)));
        assert_eq!(parse_date("03/02/2025 09:15"), Some(ymd(2025, 2, 3)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-13-40"), None);
        assert_eq!(parse_date("31/02/2025"), None);
    }

    #[test]
    fn normalizes_text_columns_per_row() -> Result<(), Box<dyn std::error::Error>> {
        let column = Series::new(
            "collected_at".into(),
            [Some("2025-01-05"), Some("garbage"), None, Some("06/01/2025")],
        )
        .into_column();
        let dates = normalize_date_column(&column)?;
        assert_eq!(
            dates,
            vec![Some(ymd(2025, 1, 5)), None, None, Some(ymd(2025, 1, 6))]
        );
        Ok(())
    }

    #[test]
    fn normalizes_native_date_columns() -> Result<(), Box<dyn std::error::Error>> {
        let column = DateChunked::from_naive_date_options(
            "collected_at".into(),
            [Some(ymd(2024, 12, 31)), None],
        )
        .into_column();
        let dates = normalize_date_column(&column)?;
        assert_eq!(dates, vec![Some(ymd(2024, 12, 31)), None]);
        Ok(())
    }
}
