//! Forecasting models for daily sales

use crate::data::{ColumnSpec, RawTable, SalesSeries};
use crate::error::{ForecastError, Result};
use crate::features::FeatureSet;
use chrono::NaiveDate;
use sales_math::RegressionMetrics;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use tracing::info;

pub mod random_forest;
pub mod seasonal_ets;

pub use random_forest::{RandomForest, RandomForestConfig, TrainedRandomForest};
pub use seasonal_ets::{SeasonalEts, SeasonalEtsConfig, TrainedSeasonalEts};

/// Model families that can be trained from an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Random forest regression on calendar features
    #[default]
    RandomForest,
    /// Exponential smoothing with weekly seasonal decomposition
    SeasonalEts,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::SeasonalEts => "seasonal_ets",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random_forest" | "rf" => Ok(ModelKind::RandomForest),
            "seasonal_ets" | "ets" => Ok(ModelKind::SeasonalEts),
            other => Err(ForecastError::ValidationError(format!(
                "Unknown model '{}'",
                other
            ))),
        }
    }
}

/// Point forecast with optional prediction interval bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointForecast {
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl PointForecast {
    fn point(value: f64) -> Self {
        Self {
            value,
            lower: None,
            upper: None,
        }
    }
}

/// Result of fitting a model, including holdout evaluation
#[derive(Debug, Clone)]
pub struct TrainingOutcome<T> {
    /// The model fitted for serving
    pub model: T,
    /// Metrics on the held-out observations
    pub metrics: RegressionMetrics,
    /// Number of observations used for fitting during evaluation
    pub train_size: usize,
    /// Number of held-out observations
    pub test_size: usize,
}

/// Trained model able to predict arbitrary dates
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Predict one value per date, in input order
    fn predict_dates(&self, dates: &[NaiveDate]) -> Result<Vec<f64>>;

    /// Predict with interval bounds where the model provides them
    fn predict_intervals(&self, dates: &[NaiveDate]) -> Result<Vec<PointForecast>> {
        Ok(self
            .predict_dates(dates)?
            .into_iter()
            .map(PointForecast::point)
            .collect())
    }

    /// Last observed day, for models that forecast step by step from it
    fn forecast_origin(&self) -> Option<NaiveDate> {
        None
    }

    /// Name of the model
    fn name(&self) -> &str;

    /// Model family
    fn kind(&self) -> ModelKind;
}

/// Forecast model that can be trained on a sales series
pub trait ForecastModel: Debug {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on sales data
    fn train(&self, series: &SalesSeries) -> Result<TrainingOutcome<Self::Trained>>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Any trained model, as stored and served
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    RandomForest(TrainedRandomForest),
    SeasonalEts(TrainedSeasonalEts),
}

impl TrainedModel {
    fn inner(&self) -> &dyn TrainedForecastModel {
        match self {
            TrainedModel::RandomForest(model) => model,
            TrainedModel::SeasonalEts(model) => model,
        }
    }
}

impl TrainedForecastModel for TrainedModel {
    fn predict_dates(&self, dates: &[NaiveDate]) -> Result<Vec<f64>> {
        self.inner().predict_dates(dates)
    }

    fn predict_intervals(&self, dates: &[NaiveDate]) -> Result<Vec<PointForecast>> {
        self.inner().predict_intervals(dates)
    }

    fn forecast_origin(&self) -> Option<NaiveDate> {
        self.inner().forecast_origin()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn kind(&self) -> ModelKind {
        self.inner().kind()
    }
}

/// Options for training a model from an uploaded table
#[derive(Debug, Clone, Default)]
pub struct TrainingRequest {
    /// Which model family to train
    pub kind: ModelKind,
    /// Column selection and date parsing
    pub columns: ColumnSpec,
    /// Calendar features (random forest only)
    pub features: Option<FeatureSet>,
    /// Number of trees (random forest only)
    pub n_trees: Option<usize>,
    /// Split and bootstrap seed (random forest only)
    pub seed: Option<u64>,
    /// Fraction of observations held out for evaluation
    pub test_ratio: Option<f64>,
    /// Seasonal period in days (seasonal ETS only)
    pub season_length: Option<usize>,
}

impl TrainingRequest {
    /// Random forest configuration with request overrides applied
    pub fn random_forest_config(&self) -> RandomForestConfig {
        let defaults = RandomForestConfig::default();
        RandomForestConfig {
            n_trees: self.n_trees.unwrap_or(defaults.n_trees),
            seed: self.seed.unwrap_or(defaults.seed),
            test_ratio: self.test_ratio.unwrap_or(defaults.test_ratio),
            features: self.features.clone().unwrap_or(defaults.features),
            ..defaults
        }
    }

    /// Seasonal ETS configuration with request overrides applied
    pub fn seasonal_ets_config(&self) -> SeasonalEtsConfig {
        let defaults = SeasonalEtsConfig::default();
        SeasonalEtsConfig {
            season_length: self.season_length.unwrap_or(defaults.season_length),
            test_ratio: self.test_ratio.unwrap_or(defaults.test_ratio),
            ..defaults
        }
    }
}

/// Everything produced by a training run
#[derive(Debug)]
pub struct TrainingReport {
    pub model: TrainedModel,
    pub metrics: RegressionMetrics,
    pub train_size: usize,
    pub test_size: usize,
    /// Number of rows read from the upload
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Train the requested model on an already loaded series
pub fn train_series(series: &SalesSeries, request: &TrainingRequest) -> Result<TrainingReport> {
    let (model, metrics, train_size, test_size) = match request.kind {
        ModelKind::RandomForest => {
            let outcome = RandomForest::new(request.random_forest_config())?.train(series)?;
            (
                TrainedModel::RandomForest(outcome.model),
                outcome.metrics,
                outcome.train_size,
                outcome.test_size,
            )
        }
        ModelKind::SeasonalEts => {
            let outcome = SeasonalEts::new(request.seasonal_ets_config())?.train(series)?;
            (
                TrainedModel::SeasonalEts(outcome.model),
                outcome.metrics,
                outcome.train_size,
                outcome.test_size,
            )
        }
    };

    info!(
        model = %request.kind,
        observations = series.len(),
        train_size,
        test_size,
        mse = metrics.mse,
        "model trained"
    );

    Ok(TrainingReport {
        model,
        metrics,
        train_size,
        test_size,
        observations: series.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
    })
}

/// Build the series from an uploaded table and train the requested model
pub fn train_from_table(table: &RawTable, request: &TrainingRequest) -> Result<TrainingReport> {
    let series = SalesSeries::from_table(table, &request.columns)?;
    train_series(&series, request)
}
