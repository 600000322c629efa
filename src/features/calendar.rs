//! Calendar features

use chrono::{Datelike, NaiveDate};

use crate::FeatureConfig;

/// Month and weekday of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    /// 1-12
    pub month: u32,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
}

impl CalendarFields {
    /// Fields used when a match has no date
    pub fn neutral(config: &FeatureConfig) -> Self {
        CalendarFields {
            month: config.neutral_month,
            weekday: config.neutral_weekday,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        CalendarFields {
            month: date.month(),
            weekday: date.weekday().num_days_from_monday(),
        }
    }

    pub fn for_date(date: Option<NaiveDate>, config: &FeatureConfig) -> Self {
        date.map(Self::from_date)
            .unwrap_or_else(|| Self::neutral(config))
    }
}
