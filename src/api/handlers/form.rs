use crate::api::error::AppError;
use crate::services::upload_service::{IncomingFile, UploadError};
use crate::utils::validation;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use std::collections::HashMap;

/// A body cut off by the request limit is an oversized file, not a malformed form
fn multipart_error(e: MultipartError, context: &str, max_file_size: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload exceeded the request body limit: {}", e);
        return AppError::Upload(UploadError::Validation(validation::file_too_large(
            max_file_size,
        )));
    }
    AppError::BadRequest(format!("{}: {}", context, e.body_text()))
}

/// Multipart form holding one `file` part plus plain text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<IncomingFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// `max_file_size` only shapes the error when the body limit is hit
    pub async fn read(mut multipart: Multipart, max_file_size: usize) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "Invalid multipart body", max_file_size))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    multipart_error(e, "Failed to read uploaded file", max_file_size)
                })?;

                form.file = Some(IncomingFile {
                    file_name,
                    content_type,
                    data,
                });
            } else if !name.is_empty() {
                let value = field.text().await.map_err(|e| {
                    multipart_error(e, &format!("Invalid field '{}'", name), max_file_size)
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self) -> Result<IncomingFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
