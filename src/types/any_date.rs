use crate::records::dates::parse_date;
use chrono::{NaiveDate, NaiveDateTime};

/// Inclusive pair of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartEndDate {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Anything a caller may hand over as a date bound: a `NaiveDate`, a timestamp, or
/// text in one of the formats the record loader understands.
pub trait AnyDate {
    fn get_date_range(self) -> Option<StartEndDate>;
}

impl AnyDate for NaiveDate {
    fn get_date_range(self) -> Option<StartEndDate> {
        Some(StartEndDate {
            start: self,
            end: self,
        })
    }
}

impl AnyDate for NaiveDateTime {
    fn get_date_range(self) -> Option<StartEndDate> {
        self.date().get_date_range()
    }
}

impl AnyDate for &str {
    fn get_date_range(self) -> Option<StartEndDate> {
        parse_date(self)?.get_date_range()
    }
}

impl AnyDate for String {
    fn get_date_range(self) -> Option<StartEndDate> {
        self.as_str().get_date_range()
    }
}
