//! BookingService — the booking ledger backed by SQLite.
//!
//! Bookings move through a two-state lifecycle: `active` on creation,
//! `deleted` once soft-deleted. A deleted booking is invisible to normal
//! reads and accepts no further mutation; the row survives for the "past
//! bookings" query. A user may hold at most [`MAX_ACTIVE_BOOKINGS`] active
//! bookings.
//!
//! The quota check is a read-then-write sequence with no atomicity
//! guarantee, so two near-simultaneous creations by the same user can both
//! pass it. That matches the original behavior and is a known limitation.

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        booking::{Booking, BookingStatus, BookingView},
        user::Role,
    },
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Maximum number of active bookings one user may hold.
pub const MAX_ACTIVE_BOOKINGS: i64 = 3;

const VIEW_COLUMNS: &str = "b.id, b.booking_date, b.user_id, b.provider_id, b.status, \
     b.created_at, p.name AS provider_name, p.province AS provider_province, \
     p.tel AS provider_tel";

/// Partial booking update; date and provider may change while active.
#[derive(Debug, Deserialize)]
pub struct BookingUpdate {
    pub booking_date: Option<DateTime<Utc>>,
    pub provider_id: Option<Uuid>,
}

/// Booking store and lifecycle rules.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<SqlitePool>,
}

impl BookingService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// List bookings visible to the caller.
    ///
    /// Regular users see only their own active bookings. Admins see every
    /// booking, optionally narrowed to one provider, and the admin view is
    /// deliberately not filtered by status.
    pub async fn list(
        &self,
        actor_id: Uuid,
        actor_role: Role,
        provider_id: Option<Uuid>,
    ) -> ApiResult<Vec<BookingView>> {
        let bookings = match (actor_role, provider_id) {
            (Role::User, _) => {
                sqlx::query_as::<_, BookingView>(&format!(
                    "SELECT {VIEW_COLUMNS} FROM bookings b
                     JOIN providers p ON p.id = b.provider_id
                     WHERE b.user_id = ? AND b.status = ?
                     ORDER BY b.created_at DESC"
                ))
                .bind(actor_id)
                .bind(BookingStatus::Active)
                .fetch_all(&*self.db)
                .await?
            }
            (Role::Admin, Some(provider_id)) => {
                sqlx::query_as::<_, BookingView>(&format!(
                    "SELECT {VIEW_COLUMNS} FROM bookings b
                     JOIN providers p ON p.id = b.provider_id
                     WHERE b.provider_id = ?
                     ORDER BY b.created_at DESC"
                ))
                .bind(provider_id)
                .fetch_all(&*self.db)
                .await?
            }
            (Role::Admin, None) => {
                sqlx::query_as::<_, BookingView>(&format!(
                    "SELECT {VIEW_COLUMNS} FROM bookings b
                     JOIN providers p ON p.id = b.provider_id
                     ORDER BY b.created_at DESC"
                ))
                .fetch_all(&*self.db)
                .await?
            }
        };
        Ok(bookings)
    }

    /// Fetch a single active booking; a soft-deleted one reads as missing.
    pub async fn get(&self, id: Uuid) -> ApiResult<BookingView> {
        sqlx::query_as::<_, BookingView>(&format!(
            "SELECT {VIEW_COLUMNS} FROM bookings b
             JOIN providers p ON p.id = b.provider_id
             WHERE b.id = ? AND b.status = ?"
        ))
        .bind(id)
        .bind(BookingStatus::Active)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No booking with the id of {}", id)))
    }

    /// All bookings of one user, both active and soft-deleted. The one
    /// non-admin read that bypasses the active-only filter.
    pub async fn list_past(&self, user_id: Uuid) -> ApiResult<Vec<BookingView>> {
        let bookings = sqlx::query_as::<_, BookingView>(&format!(
            "SELECT {VIEW_COLUMNS} FROM bookings b
             JOIN providers p ON p.id = b.provider_id
             WHERE b.user_id = ?
             ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(bookings)
    }

    /// Create an active booking for the user against the provider.
    ///
    /// Fails when the provider does not exist or when the user already
    /// holds the active-booking quota.
    pub async fn create(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        booking_date: DateTime<Utc>,
    ) -> ApiResult<Booking> {
        self.ensure_provider_exists(provider_id).await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE user_id = ? AND status = ?",
        )
        .bind(user_id)
        .bind(BookingStatus::Active)
        .fetch_one(&*self.db)
        .await?;
        if active >= MAX_ACTIVE_BOOKINGS {
            return Err(ApiError::QuotaExceeded(format!(
                "User {} already has {} active bookings",
                user_id, MAX_ACTIVE_BOOKINGS
            )));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            booking_date,
            user_id,
            provider_id,
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO bookings (id, booking_date, user_id, provider_id, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id)
        .bind(booking.booking_date)
        .bind(booking.user_id)
        .bind(booking.provider_id)
        .bind(booking.status)
        .bind(booking.created_at)
        .execute(&*self.db)
        .await?;

        Ok(booking)
    }

    /// Update an active booking's date or provider.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_role: Role,
        update: BookingUpdate,
    ) -> ApiResult<Booking> {
        let booking = self.fetch_active(id).await?;
        ensure_owner_or_admin(&booking, actor_id, actor_role, "update")?;

        if let Some(provider_id) = update.provider_id {
            self.ensure_provider_exists(provider_id).await?;
        }

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET
                 booking_date = COALESCE(?, booking_date),
                 provider_id = COALESCE(?, provider_id)
             WHERE id = ?
             RETURNING id, booking_date, user_id, provider_id, status, created_at",
        )
        .bind(update.booking_date)
        .bind(update.provider_id)
        .bind(id)
        .fetch_one(&*self.db)
        .await?;

        Ok(updated)
    }

    /// Soft-delete an active booking, keeping the row for history.
    ///
    /// The transition is terminal; calling this on an already-deleted
    /// booking reads as not found.
    pub async fn soft_delete(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_role: Role,
    ) -> ApiResult<Booking> {
        let booking = self.fetch_active(id).await?;
        ensure_owner_or_admin(&booking, actor_id, actor_role, "delete")?;

        let deleted = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ? WHERE id = ?
             RETURNING id, booking_date, user_id, provider_id, status, created_at",
        )
        .bind(BookingStatus::Deleted)
        .bind(id)
        .fetch_one(&*self.db)
        .await?;

        Ok(deleted)
    }

    async fn fetch_active(&self, id: Uuid) -> ApiResult<Booking> {
        sqlx::query_as::<_, Booking>(
            "SELECT id, booking_date, user_id, provider_id, status, created_at
             FROM bookings WHERE id = ? AND status = ?",
        )
        .bind(id)
        .bind(BookingStatus::Active)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No booking with the id of {}", id)))
    }

    async fn ensure_provider_exists(&self, provider_id: Uuid) -> ApiResult<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM providers WHERE id = ?")
            .bind(provider_id)
            .fetch_one(&*self.db)
            .await?;
        if exists == 0 {
            return Err(ApiError::NotFound(format!(
                "No provider with the id of {}",
                provider_id
            )));
        }
        Ok(())
    }
}

fn ensure_owner_or_admin(
    booking: &Booking,
    actor_id: Uuid,
    actor_role: Role,
    action: &str,
) -> ApiResult<()> {
    if booking.user_id != actor_id && actor_role != Role::Admin {
        return Err(ApiError::Forbidden(format!(
            "User {} is not authorized to {} this booking",
            actor_id, action
        )));
    }
    Ok(())
}
