//! API route handlers

use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use sales_forecast::data::parse_date;
use sales_forecast::models::train_from_table;
use sales_forecast::{
    predict_range, ColumnSpec, DataLoader, FeatureSet, FileFormat, ModelArtifact, ModelKind,
    Prediction, TrainedForecastModel, TrainingRequest,
};
use sales_math::metrics::finite_or_null;
use sales_math::RegressionMetrics;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the API router with its middleware
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/predict", post(predict))
        .route("/model", get(model_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn index() -> &'static str {
    "Welcome to the Sales Prediction API"
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.has_model().await,
    }))
}

/// Optional training options for `/upload`
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub model: Option<String>,
    pub date_column: Option<String>,
    pub target_column: Option<String>,
    pub date_format: Option<String>,
    /// Comma separated calendar features
    pub features: Option<String>,
    pub n_trees: Option<usize>,
    pub seed: Option<u64>,
    pub test_ratio: Option<f64>,
    pub season_length: Option<usize>,
}

impl UploadParams {
    pub fn training_request(&self, default_model: ModelKind) -> Result<TrainingRequest> {
        let kind = match &self.model {
            Some(name) => name.parse()?,
            None => default_model,
        };
        let features = self
            .features
            .as_deref()
            .map(FeatureSet::parse_list)
            .transpose()?;

        Ok(TrainingRequest {
            kind,
            columns: ColumnSpec {
                date_column: self.date_column.clone(),
                target_column: self.target_column.clone(),
                date_format: self.date_format.clone(),
            },
            features,
            n_trees: self.n_trees,
            seed: self.seed,
            test_ratio: self.test_ratio,
            season_length: self.season_length,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    #[serde(with = "finite_or_null")]
    pub mse: f64,
    pub metrics: RegressionMetrics,
    pub model: ModelKind,
    pub train_size: usize,
    pub test_size: usize,
    pub observations: usize,
}

/// Train a model from an uploaded CSV or Excel file
pub async fn upload(
    State(state): State<AppState>,
    params: std::result::Result<Query<UploadParams>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let Query(params) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    // Not a multipart request, or one without a boundary
    let mut multipart =
        multipart.map_err(|_| ServerError::BadRequest("No file part".to_string()))?;
    let request = params.training_request(state.config.default_model)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ServerError::BadRequest("No file part".to_string()))?;
    if file_name.trim().is_empty() {
        return Err(ServerError::BadRequest("No selected file".to_string()));
    }

    info!(
        file = %file_name,
        bytes = bytes.len(),
        model = %request.kind,
        "training on upload"
    );

    let report = tokio::task::spawn_blocking(move || {
        let table = DataLoader::from_bytes(&bytes, FileFormat::from_file_name(&file_name))?;
        train_from_table(&table, &request)
    })
    .await??;

    let artifact = state
        .install_model(ModelArtifact::from_report(report))
        .await?;

    Ok(Json(UploadResponse {
        message: "Model trained successfully",
        mse: artifact.metrics.mse,
        metrics: artifact.metrics,
        model: artifact.kind(),
        train_size: artifact.train_size,
        test_size: artifact.test_size,
        observations: artifact.observations,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
}

/// Predict every day of an inclusive date range
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let artifact = state.current_model().await?;

    let start = parse_date(&request.start_date, None)?;
    let end = parse_date(&request.end_date, None)?;
    let max_days = state.config.max_prediction_days;

    let predictions =
        tokio::task::spawn_blocking(move || predict_range(&artifact.model, start, end, max_days))
            .await??;

    Ok(Json(PredictResponse { predictions }))
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub kind: ModelKind,
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub metrics: RegressionMetrics,
    pub train_size: usize,
    pub test_size: usize,
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Metadata of the model being served
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>> {
    let artifact = state.current_model().await?;
    Ok(Json(ModelInfo {
        kind: artifact.kind(),
        name: artifact.model.name().to_string(),
        trained_at: artifact.trained_at,
        metrics: artifact.metrics,
        train_size: artifact.train_size,
        test_size: artifact.test_size,
        observations: artifact.observations,
        first_date: artifact.first_date,
        last_date: artifact.last_date,
    }))
}
