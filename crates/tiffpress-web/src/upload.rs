//! Multipart form parsing for conversion requests.
//!
//! Recognised fields:
//! - `files` (repeatable): the uploads. `file` and `files[]` are accepted too.
//! - `width`, `height`: target size; empty means the configured default.
//! - `budget_mb`: per-image ceiling in megabytes; empty means the configured one.
//!
//! Unknown fields are skipped.

use axum::extract::Multipart;
use tiffpress_core::{BatchRequest, SizeBudget, TargetDimensions, UploadedFile};

use crate::config::Config;
use crate::error::AppError;

/// Raw conversion form as submitted.
#[derive(Debug, Default)]
pub struct ConvertForm {
    pub files: Vec<UploadedFile>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub budget_mb: Option<u64>,
}

impl ConvertForm {
    /// Drain `multipart` into a form.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "files" | "file" | "files[]" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send one empty part when no file is selected.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    tracing::debug!(file = %file_name, size = bytes.len(), "Received upload");
                    form.files.push(UploadedFile::new(file_name, bytes.to_vec()));
                }
                "width" => form.width = parse_number(&name, &field.text().await?)?,
                "height" => form.height = parse_number(&name, &field.text().await?)?,
                "budget_mb" => form.budget_mb = parse_number(&name, &field.text().await?)?,
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }

    /// Resolve defaults from `config` and build the batch request.
    pub fn into_request(self, config: &Config) -> Result<BatchRequest, AppError> {
        let defaults = config.default_dimensions()?;
        let dimensions = TargetDimensions::new(
            self.width.unwrap_or(defaults.width()),
            self.height.unwrap_or(defaults.height()),
        )?;

        let budget = match self.budget_mb {
            Some(mb) => SizeBudget::from_megabytes(mb)?,
            None => config.max_output,
        };

        Ok(BatchRequest::new(self.files, dimensions)
            .with_budget(budget)
            .with_staging(config.staging))
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<Option<T>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<T>().map(Some).map_err(|_| {
        AppError::InvalidInput(format!(
            "Field '{field}' must be a positive whole number (got '{value}')"
        ))
    })
}
