use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::form::UploadForm;
use crate::entities::invoices;
use crate::services::upload_service::UploadResult;
use crate::services::webhook::WebhookRequest;
use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInvoiceRequest {
    pub file_url: Option<String>,
    pub uuid: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInvoiceResponse {
    pub success: bool,
    pub message: String,
    pub uuid: String,
    #[schema(value_type = Object)]
    pub webhook_result: Value,
}

#[utoipa::path(
    post,
    path = "/api/invoices/ai-upload",
    request_body(content = Object, description = "Invoice file in the `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResult),
        (status = 400, description = "Missing or invalid file"),
        (status = 500, description = "Conversion or storage failure")
    ),
    tag = "invoices"
)]
pub async fn upload_invoice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResult>, AppError> {
    let mut form = UploadForm::read(multipart, state.config.max_file_size).await?;
    let file = form.take_file()?;

    tracing::info!(
        file_name = %file.file_name,
        content_type = %file.content_type,
        size = file.size(),
        "Received invoice upload"
    );

    let result = state.uploads.upload(file).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/invoices/ai-process",
    request_body = ProcessInvoiceRequest,
    responses(
        (status = 200, description = "Invoice handed to the AI automation", body = ProcessInvoiceResponse),
        (status = 400, description = "Missing fileUrl or uuid"),
        (status = 500, description = "Webhook timed out, rejected the request or is unavailable")
    ),
    tag = "invoices"
)]
pub async fn process_invoice(
    State(state): State<AppState>,
    payload: Result<Json<ProcessInvoiceRequest>, JsonRejection>,
) -> Result<Json<ProcessInvoiceResponse>, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))?;

    let (Some(file_url), Some(uuid)) = (
        payload.file_url.filter(|v| !v.trim().is_empty()),
        payload.uuid.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing fileUrl or uuid".to_string()));
    };

    let request = WebhookRequest { uuid, file_url };
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid request: {}", e)))?;

    let result = state.webhook.call(&request).await?;

    Ok(Json(ProcessInvoiceResponse {
        success: true,
        message: "Invoice sent for AI processing".to_string(),
        uuid: request.uuid,
        webhook_result: result.to_value(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(
        ("id" = String, Path, description = "Upload uuid the invoice was processed under")
    ),
    responses(
        (status = 200, description = "Extracted invoice", body = invoices::Model),
        (status = 404, description = "Not processed yet or unknown"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<invoices::Model>, AppError> {
    let invoice = state
        .db
        .find_invoice(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

    Ok(Json(invoice))
}
