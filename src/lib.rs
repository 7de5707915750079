//! # Sales Prediction
//!
//! Daily sales forecasting from uploaded spreadsheets, split into:
//!
//! - [`math`]: feature scaling, train/test splits and regression metrics
//! - [`forecast`]: ingest, calendar features, models and persistence
//! - [`server`]: the HTTP API (default `server` feature)
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use sales_prediction_workspace::forecast::models::train_from_table;
//! use sales_prediction_workspace::forecast::{predict_range, DataLoader, FileFormat, TrainingRequest};
//!
//! let mut csv = String::from("Date,Valor\n");
//! for day in 1..=28 {
//!     csv.push_str(&format!("{:02}.02.23,{}\n", day, 100 + day % 7));
//! }
//!
//! let table = DataLoader::from_bytes(csv.as_bytes(), FileFormat::Csv).unwrap();
//! let request = TrainingRequest {
//!     n_trees: Some(10),
//!     ..TrainingRequest::default()
//! };
//! let report = train_from_table(&table, &request).unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2023, 3, 7).unwrap();
//! let predictions = predict_range(&report.model, start, end, 366).unwrap();
//! assert_eq!(predictions.len(), 7);
//! ```

pub use sales_forecast as forecast;
pub use sales_math as math;

#[cfg(feature = "server")]
pub use sales_server as server;
