//! HTTP handlers for the provider catalog. Reads are public; mutation is
//! admin-only, and deletion cascades to the provider's bookings.

use crate::{
    auth::{AuthUser, authorize},
    errors::AppError,
    models::user::Role,
    services::catalog_service::{NewProvider, ProviderUpdate, parse_list_params},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// GET `/api/v1/providers` — filter/sort/paginate, public.
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = parse_list_params(&query)?;
    let page = state.catalog.list(&params).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.providers.len(),
        "pagination": page.pagination,
        "data": page.providers,
    })))
}

/// GET `/api/v1/providers/{id}` — single record, public.
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let provider = state.catalog.get(id).await?;
    Ok(Json(json!({ "success": true, "data": provider })))
}

/// POST `/api/v1/providers` — create, admin only.
pub async fn create_provider(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NewProvider>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&[Role::Admin], user.role)?;
    let provider = state.catalog.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": provider })),
    ))
}

/// PUT `/api/v1/providers/{id}` — update, admin only.
pub async fn update_provider(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProviderUpdate>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&[Role::Admin], user.role)?;
    let provider = state.catalog.update(id, payload).await?;
    Ok(Json(json!({ "success": true, "data": provider })))
}

/// DELETE `/api/v1/providers/{id}` — admin only; hard-deletes the
/// provider's bookings first, then the provider.
pub async fn delete_provider(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&[Role::Admin], user.role)?;
    state.catalog.delete(id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}
