use crate::config::StorageConfig;
use crate::services::pdf::{self, ConvertError};
use crate::services::storage::{StorageError, StorageService};
use crate::utils::validation::{self, FileRules, ValidationError};
use bytes::Bytes;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conversion(#[from] ConvertError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error("Producer not found: {0}")]
    ProducerNotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    /// Object name in the invoice bucket: `{uuid}.{extension}`
    pub file_name: String,
    pub url: String,
    pub uuid: String,
    pub extension: String,
    pub original_name: String,
    /// Size of the file as received, in bytes
    pub size: usize,
    /// MIME type as received
    #[serde(rename = "type")]
    pub content_type: String,
    /// Whether an image was rendered into a PDF before storage
    pub converted: bool,
}

pub struct InvoiceUploadService {
    storage: Arc<dyn StorageService>,
    config: StorageConfig,
    rules: FileRules,
}

impl InvoiceUploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: StorageConfig, max_file_size: usize) -> Self {
        Self {
            storage,
            config,
            rules: FileRules::invoice(max_file_size),
        }
    }

    /// Validates, converts images to PDF, stores the file and returns where
    /// it can be fetched from.
    pub async fn upload(&self, file: IncomingFile) -> Result<UploadResult, UploadError> {
        validation::validate_upload(&file.file_name, &file.content_type, file.size(), &self.rules)?;

        let uuid = Uuid::new_v4().to_string();
        let converted = pdf::is_convertible_image(&file.content_type);

        let (data, extension, stored_type) = if converted {
            let source = file.data.clone();
            let rendered = tokio::task::spawn_blocking(move || pdf::image_to_pdf(&source))
                .await
                .map_err(|e| ConvertError::Render(e.to_string()))??;
            tracing::info!(
                original = %file.file_name,
                original_size = file.size(),
                pdf_size = rendered.len(),
                "Converted invoice image to PDF"
            );
            (Bytes::from(rendered), "pdf".to_string(), mime::APPLICATION_PDF.to_string())
        } else {
            (
                file.data.clone(),
                validation::file_extension(&file.file_name, &file.content_type),
                validation::normalize_mime(&file.content_type),
            )
        };

        let file_name = format!("{}.{}", uuid, extension);
        let bucket = &self.config.invoice_bucket;

        self.storage
            .upload_file(bucket, &file_name, data, &stored_type)
            .await?;

        let url = self
            .storage
            .signed_or_public_url(bucket, &file_name, self.config.signed_url_expiry())
            .await;

        Ok(UploadResult {
            success: true,
            file_name,
            url,
            uuid,
            extension,
            original_name: file.file_name,
            size: file.data.len(),
            content_type: file.content_type,
            converted,
        })
    }
}
