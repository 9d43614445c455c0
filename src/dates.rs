//! Calendar date inputs and inclusive day-by-day ranges.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::error::ReportError;

/// Default textual date format.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A date given as a date, a date-time (time of day is dropped), or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl DateInput {
    /// Resolve to a calendar date, parsing text with `format`.
    pub fn resolve(&self, format: &str) -> Result<NaiveDate, ReportError> {
        match self {
            DateInput::Date(date) => Ok(*date),
            DateInput::DateTime(datetime) => Ok(datetime.date()),
            DateInput::Text(text) => {
                NaiveDate::parse_from_str(text.trim(), format).map_err(|_| {
                    ReportError::InvalidDate {
                        input: text.clone(),
                        format: format.to_string(),
                    }
                })
            }
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(datetime: NaiveDateTime) -> Self {
        DateInput::DateTime(datetime)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        DateInput::Text(text)
    }
}

/// Resolve both ends of an inclusive range, rejecting `end < start`.
pub(crate) fn resolve_bounds(
    start: &DateInput,
    end: &DateInput,
    format: &str,
) -> Result<(NaiveDate, NaiveDate), ReportError> {
    let start = start.resolve(format)?;
    let end = end.resolve(format)?;
    if end < start {
        return Err(ReportError::InvalidDateRange { start, end });
    }
    Ok((start, end))
}

/// Every date from start to end inclusive, ascending or descending.
pub fn date_range(
    start: impl Into<DateInput>,
    end: impl Into<DateInput>,
    ascending: bool,
) -> Result<DateRange, ReportError> {
    date_range_with_format(start, end, ascending, DEFAULT_DATE_FORMAT)
}

/// Like [`date_range`] with a custom format for textual inputs.
pub fn date_range_with_format(
    start: impl Into<DateInput>,
    end: impl Into<DateInput>,
    ascending: bool,
    format: &str,
) -> Result<DateRange, ReportError> {
    let (start, end) = resolve_bounds(&start.into(), &end.into(), format)?;
    Ok(DateRange::new(start, end, ascending))
}

/// Lazy inclusive sequence of calendar dates.
#[derive(Debug, Clone)]
pub struct DateRange {
    // Remaining window, always front <= back while not exhausted.
    front: NaiveDate,
    back: NaiveDate,
    ascending: bool,
    exhausted: bool,
}

impl DateRange {
    fn new(start: NaiveDate, end: NaiveDate, ascending: bool) -> Self {
        Self {
            front: start,
            back: end,
            ascending,
            exhausted: false,
        }
    }

    fn remaining(&self) -> usize {
        if self.exhausted {
            0
        } else {
            (self.back - self.front).num_days() as usize + 1
        }
    }

    fn take_front(&mut self) -> Option<NaiveDate> {
        if self.exhausted {
            return None;
        }
        let date = self.front;
        if self.front == self.back {
            self.exhausted = true;
        } else {
            self.front = self.front.checked_add_days(Days::new(1))?;
        }
        Some(date)
    }

    fn take_back(&mut self) -> Option<NaiveDate> {
        if self.exhausted {
            return None;
        }
        let date = self.back;
        if self.front == self.back {
            self.exhausted = true;
        } else {
            self.back = self.back.checked_sub_days(Days::new(1))?;
        }
        Some(date)
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.ascending {
            self.take_front()
        } else {
            self.take_back()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for DateRange {
    fn next_back(&mut self) -> Option<NaiveDate> {
        if self.ascending {
            self.take_back()
        } else {
            self.take_front()
        }
    }
}

impl ExactSizeIterator for DateRange {}
