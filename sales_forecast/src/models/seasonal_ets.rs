//! Exponential smoothing with seasonal decomposition (augurs)
//!
//! Sales are summed per day into a regular daily series. Series covering at
//! least two full seasons are decomposed with MSTL and the trend is forecast
//! with AutoETS; shorter series use a non-seasonal AutoETS directly. Missing
//! days are filled by the library's linear interpolation transform.

use crate::data::{DailySeries, SalesSeries};
use crate::error::{ForecastError, Result};
use crate::models::{
    ForecastModel, ModelKind, PointForecast, TrainedForecastModel, TrainingOutcome,
};
use augurs::{
    ets::AutoETS,
    forecaster::{transforms::LinearInterpolator, Forecaster},
    mstl::MSTLModel,
};
use chrono::NaiveDate;
use sales_math::split::chronological_split;
use sales_math::RegressionMetrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum number of days needed to fit anything
pub const MIN_DAYS: usize = 4;

/// Longest daily history that can be fitted, about a century
pub const MAX_HISTORY_DAYS: usize = 36_600;

/// Furthest a forecast can reach past the last observation
pub const MAX_HORIZON_DAYS: usize = 3_660;

/// Seasonal ETS hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEtsConfig {
    /// Seasonal period in days
    pub season_length: usize,
    /// Fraction of the most recent days held out for evaluation
    pub test_ratio: f64,
    /// Level of the prediction intervals
    pub confidence_level: f64,
}

impl Default for SeasonalEtsConfig {
    fn default() -> Self {
        Self {
            season_length: 7,
            test_ratio: 0.2,
            confidence_level: 0.95,
        }
    }
}

/// Seasonal ETS model recipe
#[derive(Debug, Clone)]
pub struct SeasonalEts {
    /// Name of the model
    name: String,
    config: SeasonalEtsConfig,
}

/// Trained seasonal ETS model
///
/// The library model is refitted from the stored daily series on each
/// prediction, which keeps the artifact plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedSeasonalEts {
    /// Name of the model
    name: String,
    config: SeasonalEtsConfig,
    /// Daily totals the model is served from
    history: DailySeries,
}

impl SeasonalEts {
    /// Create a new seasonal ETS model
    pub fn new(config: SeasonalEtsConfig) -> Result<Self> {
        if !(2..=366).contains(&config.season_length) {
            return Err(ForecastError::InvalidParameter(
                "Season length must be between 2 and 366 days".to_string(),
            ));
        }
        if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Test ratio must be between 0 and 1".to_string(),
            ));
        }
        if !(config.confidence_level > 0.0 && config.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Confidence level must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Seasonal ETS (season={})", config.season_length),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SeasonalEtsConfig {
        &self.config
    }
}

impl ForecastModel for SeasonalEts {
    type Trained = TrainedSeasonalEts;

    fn train(&self, series: &SalesSeries) -> Result<TrainingOutcome<Self::Trained>> {
        let span = (series.last_date() - series.first_date()).num_days() + 1;
        if span > MAX_HISTORY_DAYS as i64 {
            return Err(ForecastError::DataError(format!(
                "Sales span {} days ({} to {}), at most {} are supported",
                span,
                series.first_date(),
                series.last_date(),
                MAX_HISTORY_DAYS
            )));
        }

        let history = series.daily_totals();
        if history.len() < MIN_DAYS {
            return Err(ForecastError::DataError(format!(
                "Need at least {} days of data, got {}",
                MIN_DAYS,
                history.len()
            )));
        }

        let (head, tail) = chronological_split(&history.values, self.config.test_ratio)?;

        // A gap at the end of the head cannot be interpolated, so fit up to the last observed day
        let observed_head = head
            .iter()
            .rposition(|v| !v.is_nan())
            .map(|last| &head[..=last])
            .unwrap_or_default();
        if observed_head.len() < MIN_DAYS - 1 {
            return Err(ForecastError::DataError(format!(
                "Need at least {} observed days before the holdout period",
                MIN_DAYS - 1
            )));
        }

        let skipped = head.len() - observed_head.len();
        let forecast = fit_and_forecast(observed_head, skipped + tail.len(), &self.config)?;
        let holdout = &forecast.point[skipped..];

        // Days without sales records are not scored
        let (actual, predicted): (Vec<f64>, Vec<f64>) = tail
            .iter()
            .zip(holdout)
            .filter(|(actual, _)| !actual.is_nan())
            .map(|(actual, predicted)| (*actual, *predicted))
            .unzip();
        let metrics = RegressionMetrics::evaluate(&actual, &predicted)?;

        debug!(
            days = history.len(),
            observed = history.observed_days(),
            holdout = tail.len(),
            "seasonal ETS evaluated"
        );

        let train_size = observed_head.len();
        Ok(TrainingOutcome {
            model: TrainedSeasonalEts {
                name: self.name.clone(),
                config: self.config.clone(),
                history,
            },
            metrics,
            train_size,
            test_size: actual.len(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSeasonalEts {
    /// Daily series the model is served from
    pub fn history(&self) -> &DailySeries {
        &self.history
    }

    /// Last day with data; forecasts start the day after
    pub fn last_date(&self) -> NaiveDate {
        self.history.last_date()
    }

    /// Whether the seasonal decomposition is used for this history
    pub fn is_seasonal(&self) -> bool {
        uses_decomposition(self.history.len(), &self.config)
    }
}

impl TrainedForecastModel for TrainedSeasonalEts {
    fn predict_dates(&self, dates: &[NaiveDate]) -> Result<Vec<f64>> {
        Ok(self
            .predict_intervals(dates)?
            .into_iter()
            .map(|forecast| forecast.value)
            .collect())
    }

    fn predict_intervals(&self, dates: &[NaiveDate]) -> Result<Vec<PointForecast>> {
        let last = self.last_date();
        let Some(max_date) = dates.iter().max().copied() else {
            return Ok(Vec::new());
        };

        if let Some(early) = dates.iter().find(|date| **date <= last) {
            return Err(ForecastError::ValidationError(format!(
                "Seasonal ETS can only forecast dates after the last observation ({}), got {}",
                last, early
            )));
        }

        let horizon = (max_date - last).num_days() as usize;
        if horizon > MAX_HORIZON_DAYS {
            return Err(ForecastError::ValidationError(format!(
                "{} is {} days after the last observation ({}), at most {} can be forecast",
                max_date, horizon, last, MAX_HORIZON_DAYS
            )));
        }
        let forecast = fit_and_forecast(&self.history.values, horizon, &self.config)?;
        let intervals = forecast.intervals.as_ref();

        Ok(dates
            .iter()
            .map(|date| {
                let step = (*date - last).num_days() as usize - 1;
                PointForecast {
                    value: forecast.point[step],
                    lower: intervals.and_then(|i| i.lower.get(step).copied()),
                    upper: intervals.and_then(|i| i.upper.get(step).copied()),
                }
            })
            .collect())
    }

    fn forecast_origin(&self) -> Option<NaiveDate> {
        Some(self.last_date())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModelKind {
        ModelKind::SeasonalEts
    }
}

fn uses_decomposition(days: usize, config: &SeasonalEtsConfig) -> bool {
    days >= 2 * config.season_length
}

fn interpolation() -> Vec<Box<dyn augurs::forecaster::Transformer>> {
    vec![Box::new(LinearInterpolator::default())]
}

/// Fit the library model on `values` and forecast `horizon` days ahead
fn fit_and_forecast(
    values: &[f64],
    horizon: usize,
    config: &SeasonalEtsConfig,
) -> Result<augurs::Forecast> {
    let forecast = run_forecaster(values, horizon, config)?;
    if forecast.point.len() < horizon {
        return Err(ForecastError::ModelError(format!(
            "Expected {} forecast steps, got {}",
            horizon,
            forecast.point.len()
        )));
    }
    Ok(forecast)
}

fn run_forecaster(
    values: &[f64],
    horizon: usize,
    config: &SeasonalEtsConfig,
) -> Result<augurs::Forecast> {
    if uses_decomposition(values.len(), config) {
        let trend = AutoETS::non_seasonal().into_trend_model();
        let mstl = MSTLModel::new(vec![config.season_length], trend);
        let mut forecaster = Forecaster::new(mstl).with_transformers(interpolation());

        forecaster
            .fit(values)
            .map_err(|e| ForecastError::ModelError(format!("MSTL fit error: {e}")))?;
        forecaster
            .predict(horizon, config.confidence_level)
            .map_err(|e| ForecastError::ModelError(format!("MSTL predict error: {e}")))
    } else {
        let ets = AutoETS::non_seasonal();
        let mut forecaster = Forecaster::new(ets).with_transformers(interpolation());

        forecaster
            .fit(values)
            .map_err(|e| ForecastError::ModelError(format!("ETS fit error: {e}")))?;
        forecaster
            .predict(horizon, config.confidence_level)
            .map_err(|e| ForecastError::ModelError(format!("ETS predict error: {e}")))
    }
}
