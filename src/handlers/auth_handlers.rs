//! HTTP handlers for registration, login, logout, and profile management.
//!
//! Successful register/login responses carry the signed token twice: in the
//! JSON body and as an `HttpOnly` cookie so browser clients get a session
//! without touching the payload.

use crate::{
    auth::{AuthUser, authorize},
    errors::AppError,
    models::user::{Role, User},
    services::identity_service::{NewUser, ProfileUpdate},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header, header::HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Login payload; missing fields are an authentication error, not a parse
/// error, so both are optional here.
#[derive(Debug, Deserialize)]
pub struct LoginReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST `/api/v1/auth/register` — create an account and start a session.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<Response, AppError> {
    let user = state.identity.register(payload).await?;
    send_token_response(&state, &user, StatusCode::CREATED)
}

/// POST `/api/v1/auth/login` — check credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginReq>,
) -> Result<Response, AppError> {
    let user = state.identity.login(payload.email, payload.password).await?;
    send_token_response(&state, &user, StatusCode::OK)
}

/// GET `/api/v1/auth/me` — the caller's own profile.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.identity.get(user.id).await?;
    Ok(Json(json!({ "success": true, "data": profile })))
}

/// GET `/api/v1/auth/logout` — clear the session cookie.
///
/// Tokens are stateless, so "logging out" is instructing the client to
/// discard the cookie; nothing is revoked server-side.
pub async fn logout(_user: AuthUser) -> Result<Response, AppError> {
    let mut response =
        (StatusCode::OK, Json(json!({ "success": true, "data": {} }))).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("token=; Max-Age=0; Path=/; HttpOnly"),
    );
    Ok(response)
}

/// PUT `/api/v1/auth/{id}` — update a profile, self or admin only.
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&[Role::Admin, Role::User], user.role)?;
    let updated = state
        .identity
        .update_profile(user.id, user.role, id, payload)
        .await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

/// Build the token + cookie response shared by register and login.
fn send_token_response(
    state: &AppState,
    user: &User,
    status: StatusCode,
) -> Result<Response, AppError> {
    let token = state.keys.sign(user)?;
    let cookie = session_cookie(&token, state.keys.cookie_expire_days, state.production);

    let body = Json(json!({
        "success": true,
        "_id": user.id,
        "name": user.name,
        "email": user.email,
        "token": token,
    }));

    let mut response = (status, body).into_response();
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| AppError::internal("could not encode session cookie"))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

fn session_cookie(token: &str, expire_days: i64, secure: bool) -> String {
    let max_age = expire_days * 24 * 60 * 60;
    let mut cookie = format!("token={}; Max-Age={}; Path=/; HttpOnly", token, max_age);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_shape() {
        let cookie = session_cookie("abc", 30, false);
        assert_eq!(cookie, "token=abc; Max-Age=2592000; Path=/; HttpOnly");

        let secure = session_cookie("abc", 1, true);
        assert!(secure.ends_with("; Secure"));
    }
}
