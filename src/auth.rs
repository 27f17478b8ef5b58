//! Session tokens and request authentication.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and role. They are
//! accepted either as an `Authorization: Bearer` header or as the `token`
//! cookie that login/register set. There is no server-side revocation list;
//! logout simply tells the client to discard the cookie.

use crate::{
    errors::{ApiError, ApiResult, AppError},
    models::user::{Role, User},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every session token.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: Uuid,
    /// Role at issue time.
    pub role: Role,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Signs and verifies session tokens with the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
    pub cookie_expire_days: i64,
}

impl TokenKeys {
    pub fn new(secret: impl Into<String>, cookie_expire_days: i64) -> Self {
        Self {
            secret: secret.into(),
            cookie_expire_days,
        }
    }

    /// Issue a signed token for the user, expiring after the configured
    /// number of days.
    pub fn sign(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.cookie_expire_days)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Validate signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Auth("Not authorized to access this route".into()))
    }
}

/// Fail unless `role` is in the allowed set for the route.
pub fn authorize(allowed: &[Role], role: Role) -> ApiResult<()> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}

/// The authenticated caller, resolved from the session token.
///
/// Extractor for protected routes; rejects with 401 when the token is
/// absent, malformed, expired, or carries a bad signature.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| {
                AppError::from(ApiError::Auth("Not authorized to access this route".into()))
            })?;

        let claims = state.keys.verify(&token)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn cookie_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|pair| pair.trim().strip_prefix("token="))
        .map(str::to_string)
}
