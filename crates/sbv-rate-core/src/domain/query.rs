use std::fmt::{Display, Formatter};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const VN_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// Immutable per-invocation request: which date, and whether to dump artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuery {
    target_date: Date,
    debug: bool,
}

impl RateQuery {
    pub const fn new(target_date: Date, debug: bool) -> Self {
        Self { target_date, debug }
    }

    /// Parses a strict `YYYY-MM-DD` date.
    pub fn parse(input: &str, debug: bool) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let target_date = Date::parse(trimmed, ISO_DATE).map_err(|_| {
            ValidationError::InvalidDate {
                value: trimmed.to_owned(),
            }
        })?;
        Ok(Self::new(target_date, debug))
    }

    /// Today's date in Vietnam (UTC+7), the calendar SBV publishes against.
    pub fn today(debug: bool) -> Self {
        let offset = UtcOffset::from_hms(7, 0, 0).unwrap_or(UtcOffset::UTC);
        Self::new(OffsetDateTime::now_utc().to_offset(offset).date(), debug)
    }

    pub const fn target_date(&self) -> Date {
        self.target_date
    }

    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// `2023-09-01`
    pub fn iso_date(&self) -> String {
        format_date(self.target_date, ISO_DATE)
    }

    /// `01/09/2023`, as printed on SBV pages.
    pub fn vn_date(&self) -> String {
        format_date(self.target_date, VN_DATE)
    }
}

impl Display for RateQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.iso_date())
    }
}

fn format_date(date: Date, format: &[BorrowedFormatItem<'_>]) -> String {
    date.format(format).unwrap_or_else(|_| date.to_string())
}
