//! Predictions over calendar date ranges

use crate::error::{ForecastError, Result};
use crate::features::date_range;
use crate::models::TrainedForecastModel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecast for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub prediction: f64,
    /// Lower prediction interval bound, when the model provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    /// Upper prediction interval bound, when the model provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

/// Predict every day from `start` to `end`, inclusive
///
/// `max_days` bounds both the number of requested days and, for models that
/// forecast step by step, how far past the last observation `end` may lie.
pub fn predict_range<M: TrainedForecastModel + ?Sized>(
    model: &M,
    start: NaiveDate,
    end: NaiveDate,
    max_days: usize,
) -> Result<Vec<Prediction>> {
    let dates = date_range(start, end)?;
    if dates.len() > max_days {
        return Err(ForecastError::ValidationError(format!(
            "Requested {} days, at most {} can be predicted at once",
            dates.len(),
            max_days
        )));
    }

    if let Some(origin) = model.forecast_origin() {
        let horizon = (end - origin).num_days();
        if horizon > max_days as i64 {
            return Err(ForecastError::ValidationError(format!(
                "{} is {} days after the last observation ({}), at most {} can be forecast",
                end, horizon, origin, max_days
            )));
        }
    }

    let forecasts = model.predict_intervals(&dates)?;
    Ok(dates
        .into_iter()
        .zip(forecasts)
        .map(|(date, forecast)| Prediction {
            date,
            prediction: forecast.value,
            lower: forecast.lower,
            upper: forecast.upper,
        })
        .collect())
}
