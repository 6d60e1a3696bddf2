use crate::services::upload_service::UploadError;
use crate::services::webhook::WebhookError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

impl AppError {
    fn parts(self) -> (StatusCode, String, Option<Value>) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Upload(e) => match e {
                UploadError::Validation(v) => (StatusCode::BAD_REQUEST, v.message, None),
                UploadError::ProducerNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    format!("Producer {} not found", id),
                    None,
                ),
                UploadError::Conversion(c) => {
                    tracing::error!("Image conversion failed: {}", c);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to convert image to PDF".to_string(),
                        Some(Value::String(c.to_string())),
                    )
                }
                UploadError::Storage(s) => {
                    tracing::error!("Storage error: {}", s);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to upload file to storage".to_string(),
                        Some(s.details()),
                    )
                }
                UploadError::Database(d) => AppError::Database(d).parts(),
            },
            AppError::Webhook(e) => {
                tracing::error!("AI processing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.category().message().to_string(),
                    Some(Value::String(e.to_string())),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = self.parts();

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
