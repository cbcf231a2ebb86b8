use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange { start, end }
        } else {
            DateRange { start: end, end: start }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        DateRange { start: date, end: date }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Widen the range so that it covers `date`.
    pub fn extend(&mut self, date: NaiveDate) {
        if date < self.start {
            self.start = date;
        }
        if date > self.end {
            self.end = date;
        }
    }

    /// Smallest range covering every date, or `None` for an empty input.
    pub fn covering<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        dates.into_iter().fold(None, |acc: Option<DateRange>, date| match acc {
            Some(mut range) => {
                range.extend(date);
                Some(range)
            }
            None => Some(DateRange::single(date)),
        })
    }

    pub fn days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
