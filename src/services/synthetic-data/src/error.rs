use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, SyntheticDataError>;

#[derive(Debug, thiserror::Error)]
pub enum SyntheticDataError {
    #[error("Empty dataset: no columns could be discovered in the sample")]
    EmptyDataset,

    #[error("Cannot generate from patterns: {0}")]
    PatternSummary(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    pub code: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SyntheticDataError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SyntheticDataError::EmptyDataset => "EMPTY_DATASET",
            SyntheticDataError::PatternSummary(_) => "PATTERN_SUMMARY_ERROR",
            SyntheticDataError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            SyntheticDataError::InvalidSchema(_) => "INVALID_SCHEMA",
            SyntheticDataError::Configuration(_) => "CONFIGURATION_ERROR",
            SyntheticDataError::Validation(_) => "VALIDATION_ERROR",
            SyntheticDataError::NotFound(_) => "NOT_FOUND",
            SyntheticDataError::Csv(_) => "CSV_ERROR",
            SyntheticDataError::Json(_) => "JSON_ERROR",
            SyntheticDataError::Excel(_) => "EXCEL_ERROR",
            SyntheticDataError::Io(_) => "IO_ERROR",
            SyntheticDataError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SyntheticDataError::EmptyDataset => StatusCode::UNPROCESSABLE_ENTITY,
            SyntheticDataError::PatternSummary(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SyntheticDataError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            SyntheticDataError::InvalidSchema(_) => StatusCode::BAD_REQUEST,
            SyntheticDataError::Validation(_) => StatusCode::BAD_REQUEST,
            SyntheticDataError::Csv(_) => StatusCode::BAD_REQUEST,
            SyntheticDataError::Json(_) => StatusCode::BAD_REQUEST,
            SyntheticDataError::Excel(_) => StatusCode::BAD_REQUEST,
            SyntheticDataError::NotFound(_) => StatusCode::NOT_FOUND,
            SyntheticDataError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyntheticDataError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyntheticDataError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for SyntheticDataError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let error_response = ErrorResponse {
            success: false,
            error: self.error_code().to_string(),
            message: self.to_string(),
            code: format!("{}", status_code.as_u16()),
            timestamp: chrono::Utc::now(),
        };

        if self.is_server_error() {
            tracing::error!("Server error: {:?}", self);
        } else {
            tracing::info!("Client error: {:?}", self);
        }

        (status_code, Json(error_response)).into_response()
    }
}

impl From<std::io::Error> for SyntheticDataError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                SyntheticDataError::NotFound(format!("File not found: {}", err))
            }
            _ => SyntheticDataError::Io(err.to_string()),
        }
    }
}

impl From<csv::Error> for SyntheticDataError {
    fn from(err: csv::Error) -> Self {
        SyntheticDataError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for SyntheticDataError {
    fn from(err: serde_json::Error) -> Self {
        SyntheticDataError::Json(format!("JSON parsing failed: {}", err))
    }
}

impl From<calamine::Error> for SyntheticDataError {
    fn from(err: calamine::Error) -> Self {
        SyntheticDataError::Excel(format!("Workbook could not be read: {}", err))
    }
}
