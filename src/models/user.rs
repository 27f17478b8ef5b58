//! Represents a registered account holder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access level attached to a user and carried inside session tokens.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A registered user of the booking system.
///
/// The password is only ever stored as a bcrypt hash, and the hash never
/// leaves the server: `User` deliberately does not serialize it.
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct User {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Contact telephone number.
    pub phone: String,

    /// Login email, unique across all users.
    pub email: String,

    /// Bcrypt hash of the password. Never serialized in responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Access level (`admin` or `user`).
    pub role: Role,

    /// Timestamp when the account was created.
    pub created_at: DateTime<Utc>,
}
