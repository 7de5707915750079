use sales_forecast::error::ForecastError;
use sales_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(
        ForecastError::from(io_error),
        ForecastError::IoError(_)
    ));

    let math_error = MathError::InsufficientData("need two rows".to_string());
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::Math(_)
    ));

    let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::SerializationError(_)
    ));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("n_trees must be positive".to_string());
    assert_eq!(error.to_string(), "Invalid parameter: n_trees must be positive");

    let error = ForecastError::ColumnNotFound("Valor".to_string());
    assert_eq!(error.to_string(), "Column not found: Valor");

    // Surfaces verbatim to clients calling /predict too early
    assert_eq!(ForecastError::NotTrained.to_string(), "Model not trained");

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_error_creation() {
    let data_error = ForecastError::DataError("No data rows found".to_string());
    let model_error = ForecastError::ModelError("Failed to converge".to_string());

    assert!(matches!(data_error, ForecastError::DataError(_)));
    assert!(matches!(model_error, ForecastError::ModelError(_)));

    if let ForecastError::DataError(msg) = data_error {
        assert_eq!(msg, "No data rows found");
    }
}
