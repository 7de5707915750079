//! Random forest regression on calendar features
//!
//! Each observation becomes a row of calendar features (day of week, day of
//! month, month by default). Rows are shuffled into train and test sets,
//! standardized, and fed to the smartcore random forest regressor.

use crate::data::SalesSeries;
use crate::error::{ForecastError, Result};
use crate::features::FeatureSet;
use crate::models::{ForecastModel, ModelKind, TrainedForecastModel, TrainingOutcome};
use chrono::NaiveDate;
use sales_math::split::{shuffled_split_indices, take};
use sales_math::{RegressionMetrics, StandardScaler};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Largest ensemble that can be requested
pub const MAX_TREES: usize = 1_000;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Seed for the train/test shuffle and the bootstrap samples
    pub seed: u64,
    /// Maximum tree depth; unbounded when `None`
    pub max_depth: Option<u16>,
    /// Minimum number of samples in a leaf
    pub min_samples_leaf: usize,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Fraction of observations held out for evaluation
    pub test_ratio: f64,
    /// Calendar features used as model inputs
    pub features: FeatureSet,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_leaf: 1,
            min_samples_split: 2,
            test_ratio: 0.2,
            features: FeatureSet::default(),
        }
    }
}

/// Random forest model recipe
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Name of the model
    name: String,
    config: RandomForestConfig,
}

/// Trained random forest together with its input scaler
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedRandomForest {
    /// Name of the model
    name: String,
    /// Features in the order the forest was trained on
    features: FeatureSet,
    /// Scaler fitted on the training rows
    scaler: StandardScaler,
    forest: Forest,
}

impl RandomForest {
    /// Create a new random forest model
    pub fn new(config: RandomForestConfig) -> Result<Self> {
        if !(1..=MAX_TREES).contains(&config.n_trees) {
            return Err(ForecastError::InvalidParameter(format!(
                "Number of trees must be between 1 and {}",
                MAX_TREES
            )));
        }
        if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Test ratio must be between 0 and 1".to_string(),
            ));
        }
        if config.min_samples_leaf == 0 || config.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "Leaves need at least 1 sample and splits at least 2".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Random Forest (trees={})", config.n_trees),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    fn parameters(&self) -> RandomForestRegressorParameters {
        let mut parameters = RandomForestRegressorParameters::default()
            .with_n_trees(self.config.n_trees)
            .with_m(self.config.features.len())
            .with_seed(self.config.seed)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_min_samples_split(self.config.min_samples_split);
        if let Some(depth) = self.config.max_depth {
            parameters = parameters.with_max_depth(depth);
        }
        parameters
    }
}

impl ForecastModel for RandomForest {
    type Trained = TrainedRandomForest;

    fn train(&self, series: &SalesSeries) -> Result<TrainingOutcome<Self::Trained>> {
        let rows = self.config.features.matrix(&series.dates());
        let targets = series.values();

        let (train_idx, test_idx) =
            shuffled_split_indices(series.len(), self.config.test_ratio, self.config.seed)?;

        let train_rows = take(&rows, &train_idx);
        let train_targets = take(&targets, &train_idx);
        let test_rows = take(&rows, &test_idx);
        let test_targets = take(&targets, &test_idx);

        let (scaler, scaled_train) = StandardScaler::fit_transform(&train_rows)?;
        let x_train = DenseMatrix::from_2d_vec(&scaled_train);

        debug!(
            train = train_rows.len(),
            test = test_rows.len(),
            features = self.config.features.len(),
            "fitting random forest"
        );

        let forest = Forest::fit(&x_train, &train_targets, self.parameters())
            .map_err(|e| ForecastError::ModelError(format!("Random forest fit error: {}", e)))?;

        let trained = TrainedRandomForest {
            name: self.name.clone(),
            features: self.config.features.clone(),
            scaler,
            forest,
        };

        let predicted = trained.predict_rows(&test_rows)?;
        let metrics = RegressionMetrics::evaluate(&test_targets, &predicted)?;

        Ok(TrainingOutcome {
            model: trained,
            metrics,
            train_size: train_rows.len(),
            test_size: test_rows.len(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedRandomForest {
    /// Features the model expects, in order
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Scaler applied to inputs before prediction
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let scaled = self.scaler.transform(rows)?;
        let x = DenseMatrix::from_2d_vec(&scaled);
        self.forest
            .predict(&x)
            .map_err(|e| ForecastError::ModelError(format!("Random forest predict error: {}", e)))
    }
}

impl TrainedForecastModel for TrainedRandomForest {
    fn predict_dates(&self, dates: &[NaiveDate]) -> Result<Vec<f64>> {
        self.predict_rows(&self.features.matrix(dates))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::CalendarFeature;

    #[test]
    fn test_parameters_consider_every_feature() {
        let model = RandomForest::new(RandomForestConfig {
            n_trees: 10,
            max_depth: Some(4),
            ..RandomForestConfig::default()
        })
        .unwrap();
        let parameters = model.parameters();

        assert_eq!(parameters.n_trees, 10);
        assert_eq!(parameters.m, Some(3));
        assert_eq!(parameters.max_depth, Some(4));
        assert_eq!(parameters.seed, 42);
    }

    #[test]
    fn test_parameters_follow_feature_count() {
        let features = FeatureSet::new(vec![CalendarFeature::DayOfWeek]).unwrap();
        let model = RandomForest::new(RandomForestConfig {
            features,
            ..RandomForestConfig::default()
        })
        .unwrap();

        assert_eq!(model.parameters().m, Some(1));
    }
}
