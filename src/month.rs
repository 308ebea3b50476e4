//! Calendar month value type used for trend and cohort grouping

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// A calendar month (year + month), the grouping unit for trends and cohorts.
///
/// Ordering is chronological; serializes as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn from_datetime(ts: NaiveDateTime) -> Self {
        Self::from_date(ts.date())
    }

    /// Month `k` calendar months after this one.
    pub fn offset(&self, k: u32) -> Self {
        let zero_based = self.year * 12 + (self.month as i32 - 1) + k as i32;
        Self {
            year: zero_based.div_euclid(12),
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.split_once('-')?;
        let year: i32 = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_wraps_year() {
        assert_eq!(Month::new(2017, 11).offset(0), Month::new(2017, 11));
        assert_eq!(Month::new(2017, 11).offset(2), Month::new(2018, 1));
        assert_eq!(Month::new(2017, 12).offset(13), Month::new(2019, 1));
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(Month::new(2017, 12) < Month::new(2018, 1));
        assert!(Month::new(2018, 3) > Month::new(2018, 2));
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let m = Month::parse("2017-05").unwrap();
        assert_eq!(m, Month::new(2017, 5));
        assert_eq!(m.to_string(), "2017-05");
        assert!(Month::parse("2017-13").is_none());
        assert!(Month::parse("2017").is_none());
    }
}
