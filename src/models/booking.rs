//! Represents a reservation linking a user to a provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a booking.
///
/// `Active` is the initial state; `Deleted` is terminal (soft delete, the
/// row is retained for "past bookings" queries). An explicit enum rather
/// than a boolean flag leaves room for future states without ambiguity.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Deleted,
}

/// A reservation held by a user against a provider.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Booking {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Date the booking is for.
    pub booking_date: DateTime<Utc>,

    /// Owning user.
    pub user_id: Uuid,

    /// Provider the booking is made against.
    pub provider_id: Uuid,

    /// Current lifecycle state.
    pub status: BookingStatus,

    /// Timestamp when the booking was created.
    pub created_at: DateTime<Utc>,
}

/// A booking row joined with the projected provider fields that list and
/// detail responses include (name, province, tel only).
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct BookingView {
    pub id: Uuid,
    pub booking_date: DateTime<Utc>,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub provider_name: String,
    pub provider_province: String,
    pub provider_tel: String,
}
