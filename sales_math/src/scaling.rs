//! Feature standardization
//!
//! Centers every column on its mean and divides by its population standard
//! deviation, so that features measured on different ranges (day of month
//! versus day of week) end up on a comparable scale.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Per-column standardization fitted on a training matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column means
    means: Vec<f64>,
    /// Column scales (population standard deviation, or 1.0 for constant columns)
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit a scaler on row-major data
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = check_rows(rows)?;
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((scale, value), mean) in scales.iter_mut().zip(row).zip(&means) {
                *scale += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std_dev = (*scale / n).sqrt();
            // Constant columns are left unscaled
            *scale = if std_dev.is_finite() && std_dev > 0.0 {
                std_dev
            } else {
                1.0
            };
        }

        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Fitted column means
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted column scales
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardize a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} columns, scaler was fitted on {}",
                row.len(),
                self.width()
            )));
        }

        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((value, mean), scale)| (value - mean) / scale)
            .collect())
    }

    /// Standardize a matrix of rows
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Fit on the rows and return them standardized
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }
}

fn check_rows(rows: &[Vec<f64>]) -> Result<usize> {
    let width = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty matrix".to_string(),
            ))
        }
    };

    if let Some(index) = rows.iter().position(|row| row.len() != width) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} columns, expected {}",
            index,
            rows[index].len(),
            width
        )));
    }

    Ok(width)
}
