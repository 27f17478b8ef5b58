//! HTTP handlers for the booking ledger. Every route here requires a
//! session; ownership and role rules live in the service.

use crate::{
    auth::AuthUser,
    errors::{ApiError, AppError},
    services::booking_service::BookingUpdate,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookingReq {
    pub booking_date: Option<DateTime<Utc>>,
}

/// GET `/api/v1/bookings` — scoped by role: regular users get their own
/// active bookings, admins get everything.
pub async fn get_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.ledger.list(user.id, user.role, None).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    })))
}

/// GET `/api/v1/providers/{id}/bookings` — same listing narrowed to one
/// provider (the narrowing only applies to the admin view).
pub async fn get_provider_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state
        .ledger
        .list(user.id, user.role, Some(provider_id))
        .await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    })))
}

/// GET `/api/v1/bookings/past` — the caller's full history, soft-deleted
/// bookings included.
pub async fn get_past_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.ledger.list_past(user.id).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    })))
}

/// GET `/api/v1/bookings/{id}` — single active booking.
pub async fn get_booking(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.ledger.get(id).await?;
    Ok(Json(json!({ "success": true, "data": booking })))
}

/// POST `/api/v1/providers/{id}/bookings` — quota-checked creation.
///
/// The travel suggestion is fetched before the booking is persisted and a
/// failed fetch never blocks creation; the fallback string simply rides
/// along in the response.
pub async fn add_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<CreateBookingReq>,
) -> Result<impl IntoResponse, AppError> {
    let booking_date = payload
        .booking_date
        .ok_or_else(|| ApiError::Validation("Please add a booking date".into()))?;

    let provider = state.catalog.get(provider_id).await?;
    let suggestion = state.suggestions.suggest(&provider).await;
    let booking = state
        .ledger
        .create(user.id, provider.id, booking_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": booking,
            "message": suggestion,
        })),
    ))
}

/// PUT `/api/v1/bookings/{id}` — owner or admin.
pub async fn update_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.ledger.update(id, user.id, user.role, payload).await?;
    Ok(Json(json!({ "success": true, "data": booking })))
}

/// DELETE `/api/v1/bookings/{id}` — soft delete, owner or admin.
pub async fn delete_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.ledger.soft_delete(id, user.id, user.role).await?;
    Ok(Json(json!({ "success": true, "data": booking })))
}
