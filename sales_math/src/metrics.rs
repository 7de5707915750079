//! Regression metrics for evaluating forecasts against held-out sales
//!
//! The free functions follow the convention of returning `NaN` for inputs
//! they cannot score (empty or mismatched), so they can be used inline in
//! reports. [`RegressionMetrics::evaluate`] is the checked entry point.

use crate::{MathError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn comparable(actual: &[f64], predicted: &[f64]) -> bool {
    !actual.is_empty() && actual.len() == predicted.len()
}

/// Mean Squared Error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }

    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Root Mean Squared Error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_squared_error(actual, predicted).sqrt()
}

/// Mean Absolute Error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }

    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Mean Absolute Percentage Error, as a fraction
///
/// Pairs whose actual value is zero are skipped.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }

    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Coefficient of determination
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total == 0.0 {
        return f64::NAN;
    }

    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    1.0 - residual / total
}

/// Holdout metrics reported after training a model
///
/// Non-finite values serialize as `null` and read back as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    #[serde(with = "finite_or_null")]
    pub mse: f64,
    /// Root Mean Squared Error
    #[serde(with = "finite_or_null")]
    pub rmse: f64,
    /// Mean Absolute Error
    #[serde(with = "finite_or_null")]
    pub mae: f64,
    /// Mean Absolute Percentage Error (fraction)
    #[serde(with = "finite_or_null")]
    pub mape: f64,
    /// Coefficient of determination
    #[serde(with = "finite_or_null")]
    pub r2: f64,
}

/// Serde adapter mapping non-finite floats to `null`
pub mod finite_or_null {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &f64,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl RegressionMetrics {
    /// Score predictions against actual values
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if !comparable(actual, predicted) {
            return Err(MathError::InvalidInput(format!(
                "Actual ({}) and predicted ({}) values must have the same non-zero length",
                actual.len(),
                predicted.len()
            )));
        }

        let mse = mean_squared_error(actual, predicted);
        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(actual, predicted),
            mape: mean_absolute_percentage_error(actual, predicted),
            r2: r2_score(actual, predicted),
        })
    }
}

impl std::fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Holdout Metrics:")?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape * 100.0)?;
        writeln!(f, "  R2:    {:.4}", self.r2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        assert_approx_eq!(mean_absolute_error(&actual, &predicted), 2.4, 0.01);
        assert_approx_eq!(mean_squared_error(&actual, &predicted), 6.0, 0.01);
        assert_approx_eq!(root_mean_squared_error(&actual, &predicted), 2.449, 0.01);

        let mape = mean_absolute_percentage_error(&actual, &predicted);
        assert!(mape > 0.0 && mape < 0.15);

        // 1 - 30 / 1000
        assert_approx_eq!(r2_score(&actual, &predicted), 0.97, 0.001);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let actual = vec![0.0, 10.0];
        let predicted = vec![5.0, 12.0];
        assert_approx_eq!(mean_absolute_percentage_error(&actual, &predicted), 0.2);

        assert!(mean_absolute_percentage_error(&[0.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_nan_on_bad_input() {
        let empty: Vec<f64> = vec![];
        assert!(mean_absolute_error(&empty, &empty).is_nan());
        assert!(mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_nan());
        assert!(r2_score(&[3.0, 3.0], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn test_evaluate() {
        let metrics = RegressionMetrics::evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).unwrap();
        assert_approx_eq!(metrics.mse, 1.0 / 3.0);
        assert_approx_eq!(metrics.rmse, (1.0f64 / 3.0).sqrt());
        assert_approx_eq!(metrics.mae, 1.0 / 3.0);

        assert!(RegressionMetrics::evaluate(&[], &[]).is_err());
        assert!(RegressionMetrics::evaluate(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_nan_metrics_serialize_as_null() {
        let metrics = RegressionMetrics::evaluate(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"mape\":null"));
        assert!(json.contains("\"r2\":null"));

        let restored: RegressionMetrics = serde_json::from_str(&json).unwrap();
        assert!(restored.mape.is_nan());
        assert_approx_eq!(restored.mse, 1.0);
    }
}
