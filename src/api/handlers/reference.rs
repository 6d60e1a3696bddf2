use crate::AppState;
use crate::api::error::AppError;
use crate::entities::{countries, currencies};
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/api/currencies",
    responses(
        (status = 200, description = "Supported currencies", body = Vec<currencies::Model>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "reference"
)]
pub async fn list_currencies(
    State(state): State<AppState>,
) -> Result<Json<Vec<currencies::Model>>, AppError> {
    Ok(Json(state.db.list_currencies().await?))
}

#[utoipa::path(
    get,
    path = "/api/countries",
    responses(
        (status = 200, description = "Supported countries", body = Vec<countries::Model>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "reference"
)]
pub async fn list_countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<countries::Model>>, AppError> {
    Ok(Json(state.db.list_countries().await?))
}
