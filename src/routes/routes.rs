//! Defines all routes for the booking management API.
//!
//! ## Structure (everything versioned under `/api/v1`)
//! - **Auth**
//!   - `POST /auth/register` — create account, set session cookie
//!   - `POST /auth/login` — check credentials, set session cookie
//!   - `GET  /auth/me` — caller's profile (session)
//!   - `GET  /auth/logout` — clear session cookie (session)
//!   - `PUT  /auth/{id}` — profile update, self or admin (session)
//!
//! - **Providers**
//!   - `GET    /providers` — filter/sort/paginate (public)
//!   - `GET    /providers/{id}` — single record (public)
//!   - `POST   /providers` — create (admin)
//!   - `PUT    /providers/{id}` — update (admin)
//!   - `DELETE /providers/{id}` — delete, cascades to bookings (admin)
//!
//! - **Bookings** (all session-required)
//!   - `GET    /bookings` — scoped by role
//!   - `GET    /bookings/past` — caller's history incl. soft-deleted
//!   - `GET    /bookings/{id}` — active only
//!   - `GET    /providers/{id}/bookings` — provider-scoped listing
//!   - `POST   /providers/{id}/bookings` — quota-checked create
//!   - `PUT    /bookings/{id}` — owner or admin
//!   - `DELETE /bookings/{id}` — soft delete, owner or admin
//!
//! Health probes (`/healthz`, `/readyz`) are mounted at the root.

use crate::{
    handlers::{
        auth_handlers::{login, logout, me, register, update_user},
        booking_handlers::{
            add_booking, delete_booking, get_booking, get_bookings, get_past_bookings,
            get_provider_bookings, update_booking,
        },
        health_handlers::{healthz, readyz},
        provider_handlers::{
            create_provider, delete_provider, get_provider, list_providers, update_provider,
        },
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the whole API.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout))
        .route("/auth/{id}", axum::routing::put(update_user))
        // Providers
        .route("/providers", get(list_providers).post(create_provider))
        .route(
            "/providers/{id}",
            get(get_provider)
                .put(update_provider)
                .delete(delete_provider),
        )
        .route(
            "/providers/{id}/bookings",
            get(get_provider_bookings).post(add_booking),
        )
        // Bookings
        .route("/bookings", get(get_bookings))
        .route("/bookings/past", get(get_past_bookings))
        .route(
            "/bookings/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        );

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
}
