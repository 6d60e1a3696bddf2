use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::form::UploadForm;
use crate::entities::producers;
use crate::services::producer_service::LogoType;
use crate::services::upload_service::UploadError;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoResponse {
    pub success: bool,
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/api/producers/{id}/logo",
    params(
        ("id" = String, Path, description = "Producer ID")
    ),
    request_body(content = Object, description = "`file` image and `logoType` (logo, logo_white, logo_black, logo_banner)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Logo stored", body = LogoResponse),
        (status = 400, description = "Invalid file or logoType"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Producer not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "producers"
)]
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<LogoResponse>, AppError> {
    let mut form = UploadForm::read(multipart, state.config.max_file_size).await?;

    let logo_type: LogoType = form
        .field("logoType")
        .ok_or_else(|| AppError::BadRequest("Missing logoType".to_string()))?
        .parse()
        .map_err(|e: crate::utils::validation::ValidationError| AppError::BadRequest(e.message))?;
    let file = form.take_file()?;

    tracing::info!(
        user = %claims.sub,
        producer_id = %id,
        logo_type = logo_type.as_str(),
        "Uploading producer logo"
    );

    let url = state.producers.upload_logo(&id, logo_type, file).await?;

    Ok(Json(LogoResponse { success: true, url }))
}

#[utoipa::path(
    get,
    path = "/api/producers/{id}",
    params(
        ("id" = String, Path, description = "Producer ID")
    ),
    responses(
        (status = 200, description = "Producer", body = producers::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Producer not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "producers"
)]
pub async fn get_producer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<producers::Model>, AppError> {
    let producer = state
        .producers
        .get_producer(&id)
        .await
        .map_err(|e| match e {
            UploadError::ProducerNotFound(_) => {
                AppError::NotFound(format!("Producer {} not found", id))
            }
            other => AppError::Upload(other),
        })?;

    Ok(Json(producer))
}
