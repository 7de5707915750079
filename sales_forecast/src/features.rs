//! Calendar features derived from observation dates

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single numeric feature computed from a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarFeature {
    /// Monday = 0 ... Sunday = 6
    DayOfWeek,
    DayOfMonth,
    Month,
    Year,
    DayOfYear,
    /// ISO week number
    WeekOfYear,
    /// 1.0 on Saturday and Sunday, otherwise 0.0
    IsWeekend,
}

impl CalendarFeature {
    /// All supported features
    pub const ALL: [CalendarFeature; 7] = [
        CalendarFeature::DayOfWeek,
        CalendarFeature::DayOfMonth,
        CalendarFeature::Month,
        CalendarFeature::Year,
        CalendarFeature::DayOfYear,
        CalendarFeature::WeekOfYear,
        CalendarFeature::IsWeekend,
    ];

    /// Compute the feature for a date
    pub fn value(&self, date: NaiveDate) -> f64 {
        match self {
            CalendarFeature::DayOfWeek => date.weekday().num_days_from_monday() as f64,
            CalendarFeature::DayOfMonth => date.day() as f64,
            CalendarFeature::Month => date.month() as f64,
            CalendarFeature::Year => date.year() as f64,
            CalendarFeature::DayOfYear => date.ordinal() as f64,
            CalendarFeature::WeekOfYear => date.iso_week().week() as f64,
            CalendarFeature::IsWeekend => match date.weekday() {
                Weekday::Sat | Weekday::Sun => 1.0,
                _ => 0.0,
            },
        }
    }

    /// Snake case name, as used in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarFeature::DayOfWeek => "day_of_week",
            CalendarFeature::DayOfMonth => "day_of_month",
            CalendarFeature::Month => "month",
            CalendarFeature::Year => "year",
            CalendarFeature::DayOfYear => "day_of_year",
            CalendarFeature::WeekOfYear => "week_of_year",
            CalendarFeature::IsWeekend => "is_weekend",
        }
    }
}

impl fmt::Display for CalendarFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarFeature {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        CalendarFeature::ALL
            .iter()
            .copied()
            .find(|feature| feature.as_str() == name)
            .ok_or_else(|| ForecastError::ValidationError(format!("Unknown feature '{}'", s)))
    }
}

/// Ordered set of features making up one model input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet(Vec<CalendarFeature>);

impl Default for FeatureSet {
    fn default() -> Self {
        Self(vec![
            CalendarFeature::DayOfWeek,
            CalendarFeature::DayOfMonth,
            CalendarFeature::Month,
        ])
    }
}

impl FeatureSet {
    /// Create a feature set, rejecting empty or duplicated lists
    pub fn new(features: Vec<CalendarFeature>) -> Result<Self> {
        if features.is_empty() {
            return Err(ForecastError::ValidationError(
                "At least one feature is required".to_string(),
            ));
        }

        for (i, feature) in features.iter().enumerate() {
            if features[..i].contains(feature) {
                return Err(ForecastError::ValidationError(format!(
                    "Feature '{}' listed more than once",
                    feature
                )));
            }
        }

        Ok(Self(features))
    }

    /// Parse a comma separated list such as `day_of_week,month`
    pub fn parse_list(list: &str) -> Result<Self> {
        let features = list
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(CalendarFeature::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(features)
    }

    /// The features in input order
    pub fn features(&self) -> &[CalendarFeature] {
        &self.0
    }

    /// Number of features per row
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Feature row for one date
    pub fn row(&self, date: NaiveDate) -> Vec<f64> {
        self.0.iter().map(|feature| feature.value(date)).collect()
    }

    /// Feature matrix for a list of dates
    pub fn matrix(&self, dates: &[NaiveDate]) -> Vec<Vec<f64>> {
        dates.iter().map(|&date| self.row(date)).collect()
    }
}

/// Inclusive daily date range
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(ForecastError::ValidationError(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    Ok(start.iter_days().take_while(|date| *date <= end).collect())
}
