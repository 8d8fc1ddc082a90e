//! Conversion endpoints.
//!
//! `POST /convert` serves browsers. When every file converted it answers with
//! the archive as an attachment; otherwise with an HTML page that lists the
//! per-file errors and, if anything converted, links the archive.
//! `POST /api/convert` always answers with the archive itself, or a JSON error.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tiffpress_core::{convert_batch, BatchReport, BatchRequest, ARCHIVE_FILE_NAME, ARCHIVE_MIME};

use crate::error::{AppError, FileFailure};
use crate::html;
use crate::state::AppState;
use crate::upload::ConvertForm;

pub const CONVERTED_FILES_HEADER: &str = "x-converted-files";
pub const CONVERSION_FAILURES_HEADER: &str = "x-conversion-failures";
pub const FAILED_FILES_HEADER: &str = "x-failed-files";

/// Run the batch on the blocking pool; decoding and encoding are CPU bound.
async fn run_batch(request: BatchRequest) -> Result<BatchReport, AppError> {
    let files = request.files.len();
    let dimensions = request.dimensions;
    tracing::info!(
        files,
        width = dimensions.width(),
        height = dimensions.height(),
        budget_bytes = request.budget.bytes(),
        "Starting conversion"
    );

    let report = tokio::task::spawn_blocking(move || convert_batch(request)).await??;
    Ok(report)
}

async fn read_and_convert(
    state: &AppState,
    multipart: Multipart,
) -> Result<Option<BatchReport>, AppError> {
    let form = ConvertForm::read(multipart).await?;
    if form.files.is_empty() {
        return Ok(None);
    }
    let request = form.into_request(&state.config)?;
    Ok(Some(run_batch(request).await?))
}

/// POST /convert
#[tracing::instrument(skip(state, multipart))]
pub async fn convert_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (width, height) = (state.config.default_width, state.config.default_height);

    let report = match read_and_convert(&state, multipart).await {
        Ok(Some(report)) => report,
        Ok(None) => {
            return Html(html::empty_selection_page(width, height).into_string()).into_response()
        }
        Err(err) => return err.into_html_response(width, height),
    };

    if report.failed_count() > 0 || report.archive.is_none() {
        return Html(html::result_page(&report, width, height).into_string()).into_response();
    }

    match archive_response(report) {
        Ok(response) => response,
        Err(err) => err.into_html_response(width, height),
    }
}

/// POST /api/convert
#[tracing::instrument(skip(state, multipart))]
pub async fn convert_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ConvertForm::read(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::NoFiles);
    }

    let request = form.into_request(&state.config)?;
    let report = run_batch(request).await?;
    archive_response(report)
}

/// `200` with the ZIP as an attachment plus count headers, or
/// `NothingConverted` when the batch produced no archive.
fn archive_response(report: BatchReport) -> Result<Response, AppError> {
    let converted = report.converted_count();
    let failed = report.failed_count();
    let failures = FileFailure::from_report(&report);

    let Some(archive) = report.archive else {
        return Err(AppError::NothingConverted { failures });
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARCHIVE_MIME)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
        )
        .header(CONVERTED_FILES_HEADER, converted)
        .header(CONVERSION_FAILURES_HEADER, failed)
        .body(Body::from(archive))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    if !failures.is_empty() {
        let names = failures
            .iter()
            .map(|f| header_safe(&f.file))
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&names) {
            response.headers_mut().insert(FAILED_FILES_HEADER, value);
        }
    }

    Ok(response)
}

/// Replace anything outside visible ASCII so the name fits in a header.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect()
}
