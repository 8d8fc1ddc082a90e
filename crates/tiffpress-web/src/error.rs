//! HTTP error type
//!
//! Handlers return `Result<_, AppError>`. JSON endpoints render it through
//! [`IntoResponse`]; the HTML form flow renders it with
//! [`AppError::into_html_response`] so browsers get a readable page.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tiffpress_core::{BatchError, BatchReport, CompressError, FileOutcome};

use crate::html;

/// One file that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub code: String,
    pub message: String,
}

impl FileFailure {
    pub fn from_report(report: &BatchReport) -> Vec<Self> {
        report
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Failed { source_name, error } => Some(Self {
                    file: source_name.clone(),
                    code: error.kind().to_string(),
                    message: error.to_string(),
                }),
                FileOutcome::Converted(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("No files were uploaded")]
    NoFiles,

    #[error("None of the uploaded files could be converted")]
    NothingConverted { failures: Vec<FileFailure> },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::NoFiles => StatusCode::BAD_REQUEST,
            AppError::NothingConverted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NoFiles => "NO_FILES",
            AppError::NothingConverted { .. } => "NOTHING_CONVERTED",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show a client. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Conversion failed unexpectedly".to_string(),
            other => other.to_string(),
        }
    }

    /// Render as an HTML page carrying the upload form again.
    pub fn into_html_response(self, default_width: u32, default_height: u32) -> Response {
        self.log();
        let messages = match &self {
            AppError::NothingConverted { failures } => failures
                .iter()
                .map(|f| format!("Error converting {}: {}", f.file, f.message))
                .collect(),
            other => vec![other.client_message()],
        };
        let page = html::error_page(&messages, default_width, default_height);
        (self.status(), Html(page.into_string())).into_response()
    }

    fn log(&self) {
        match self {
            AppError::Internal(detail) => {
                tracing::error!(code = self.code(), detail = %detail, "Request failed");
            }
            AppError::NothingConverted { failures } => {
                tracing::warn!(
                    code = self.code(),
                    failed = failures.len(),
                    "No file in the batch converted"
                );
            }
            other => {
                tracing::warn!(code = other.code(), error = %other, "Rejected request");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let body = ErrorResponse {
            error: self.client_message(),
            code: self.code().to_string(),
            failures: match self {
                AppError::NothingConverted { failures } => failures,
                _ => Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!("Upload exceeds the size limit: {}", err.body_text()))
        } else {
            AppError::InvalidInput(format!("Malformed upload: {}", err.body_text()))
        }
    }
}

impl From<CompressError> for AppError {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::InvalidDimensions { .. } | CompressError::InvalidBudget => {
                AppError::InvalidInput(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Conversion task failed: {err}"))
    }
}
