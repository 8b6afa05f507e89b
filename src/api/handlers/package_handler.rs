use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::package_dto::*},
    error::AppError,
};

/// `GET /packages?creds=...`
///
/// 返回仓库中的 docker 包；`group` 为 true 时按镜像名分组并附带 `pullTags`。
pub async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<CredsParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = CredsQuery::parse(params.creds.as_deref())?;
    debug!(?query, "List packages");

    let request = query.into_request()?;
    let packages = state.catalog_service.packages(&request).await?;

    Ok(Json(packages))
}

/// `GET /images?creds=...`
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<CredsParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = CredsQuery::parse(params.creds.as_deref())?;
    debug!(?query, "List images");

    let request = query.into_request()?;
    let images = state.catalog_service.images(&request).await?;

    Ok(Json(images))
}
