//! Represents a service provider that bookings are made against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A service provider in the catalog.
///
/// Providers are managed by admins and referenced by bookings. Deleting a
/// provider removes every booking pointing at it (hard delete).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Provider {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Provider name.
    pub name: String,

    /// House number, street, road.
    pub address: String,

    /// District.
    pub district: String,

    /// Province.
    pub province: String,

    /// 5-digit postal code.
    pub postalcode: String,

    /// Telephone number.
    pub tel: String,

    /// Geographic region, fed into the travel-suggestion prompt.
    pub region: String,

    /// Timestamp when the record was created.
    pub created_at: DateTime<Utc>,
}
