//! Shared application state handed to the router.

use crate::{
    auth::TokenKeys,
    services::{
        booking_service::BookingService, catalog_service::CatalogService,
        identity_service::IdentityService, suggestion_service::SuggestionClient,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything a handler needs, constructed once at startup.
///
/// All services share the same pool; the raw handle is also kept for the
/// readiness probe.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub identity: IdentityService,
    pub catalog: CatalogService,
    pub ledger: BookingService,
    pub suggestions: SuggestionClient,
    pub keys: TokenKeys,
    pub production: bool,
}
