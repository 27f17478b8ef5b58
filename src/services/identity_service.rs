//! IdentityService — user accounts and credential checks backed by SQLite.
//!
//! Passwords are bcrypt-hashed before they touch the database and the hash
//! is never serialized back out. Token signing lives in `crate::auth`; this
//! service only answers "who is this" and "is this password right".

use crate::{
    errors::{ApiError, ApiResult},
    models::user::{Role, User},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// Fields accepted at registration. Defaults let missing body fields fall
/// through to validation instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Partial profile update; only name, email, and phone may change.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// User store and credential verifier.
#[derive(Clone)]
pub struct IdentityService {
    db: Arc<SqlitePool>,
}

impl IdentityService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create an account. The plaintext password is hashed here and
    /// discarded; only the hash is stored.
    pub async fn register(&self, new_user: NewUser) -> ApiResult<User> {
        if new_user.name.trim().is_empty() {
            return Err(ApiError::Validation("Please add a name".into()));
        }
        if new_user.phone.trim().is_empty() {
            return Err(ApiError::Validation("Please add a telephone number".into()));
        }
        if !is_plausible_email(&new_user.email) {
            return Err(ApiError::Validation("Please add a valid email".into()));
        }
        if new_user.password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".into(),
            ));
        }

        let password_hash = bcrypt::hash(&new_user.password, bcrypt::DEFAULT_COST)?;
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            phone: new_user.phone,
            email: new_user.email,
            password_hash,
            role: new_user.role.unwrap_or(Role::User),
            created_at: Utc::now(),
        };

        match sqlx::query(
            "INSERT INTO users (id, name, phone, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&*self.db)
        .await
        {
            Ok(_) => Ok(user),
            Err(err) if is_unique_violation(&err) => Err(ApiError::Validation(format!(
                "An account with email `{}` already exists",
                user.email
            ))),
            Err(err) => Err(ApiError::Sqlx(err)),
        }
    }

    /// Check credentials and return the matching user.
    ///
    /// Missing fields and bad credentials are both authentication errors;
    /// the latter deliberately does not reveal whether the email exists.
    pub async fn login(
        &self,
        email: Option<String>,
        password: Option<String>,
    ) -> ApiResult<User> {
        let (Some(email), Some(password)) = (email, password) else {
            return Err(ApiError::Auth(
                "Please provide an email and password".into(),
            ));
        };

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, phone, email, password_hash, role, created_at
             FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid credentials".into()))?;

        if !bcrypt::verify(&password, &user.password_hash)? {
            return Err(ApiError::Auth("Invalid credentials".into()));
        }

        Ok(user)
    }

    /// Fetch a user by id.
    pub async fn get(&self, id: Uuid) -> ApiResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, phone, email, password_hash, role, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found with id of {}", id)))
    }

    /// Partial update of name/email/phone, permitted for the user itself or
    /// an admin acting on anyone.
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        actor_role: Role,
        target_id: Uuid,
        update: ProfileUpdate,
    ) -> ApiResult<User> {
        if actor_role != Role::Admin && actor_id != target_id {
            return Err(ApiError::Forbidden(
                "You are not authorized to update this user".into(),
            ));
        }

        if let Some(email) = &update.email {
            if !is_plausible_email(email) {
                return Err(ApiError::Validation("Please add a valid email".into()));
            }
        }

        let result = sqlx::query_as::<_, User>(
            "UPDATE users SET
                 name = COALESCE(?, name),
                 email = COALESCE(?, email),
                 phone = COALESCE(?, phone)
             WHERE id = ?
             RETURNING id, name, phone, email, password_hash, role, created_at",
        )
        .bind(update.name)
        .bind(update.email)
        .bind(update.phone)
        .bind(target_id)
        .fetch_optional(&*self.db)
        .await;

        match result {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ApiError::NotFound(format!(
                "User not found with id of {}",
                target_id
            ))),
            Err(err) if is_unique_violation(&err) => Err(ApiError::Validation(
                "An account with that email already exists".into(),
            )),
            Err(err) => Err(ApiError::Sqlx(err)),
        }
    }
}

/// Cheap shape check; real validation is the unique index plus delivery.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Return true if SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_service() -> IdentityService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        IdentityService::new(Arc::new(pool))
    }

    fn somsak() -> NewUser {
        NewUser {
            name: "Somsak".into(),
            phone: "02-2187000".into(),
            email: "somsak@example.com".into(),
            password: "secret123".into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = test_service().await;

        let created = service.register(somsak()).await.unwrap();
        assert_eq!(created.role, Role::User);
        assert_ne!(created.password_hash, "secret123");

        let logged_in = service
            .login(Some("somsak@example.com".into()), Some("secret123".into()))
            .await
            .unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = test_service().await;
        service.register(somsak()).await.unwrap();

        let mut again = somsak();
        again.name = "Somchai".into();
        assert!(matches!(
            service.register(again).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let service = test_service().await;
        service.register(somsak()).await.unwrap();

        assert!(matches!(
            service
                .login(Some("somsak@example.com".into()), Some("wrong-pass".into()))
                .await,
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            service
                .login(Some("nobody@example.com".into()), Some("secret123".into()))
                .await,
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            service.login(Some("somsak@example.com".into()), None).await,
            Err(ApiError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_enforces_self_or_admin() {
        let service = test_service().await;
        let owner = service.register(somsak()).await.unwrap();
        let other = service
            .register(NewUser {
                name: "Somchai".into(),
                phone: "02-0000000".into(),
                email: "somchai@example.com".into(),
                password: "secret123".into(),
                role: None,
            })
            .await
            .unwrap();

        let update = || ProfileUpdate {
            name: Some("Renamed".into()),
            email: None,
            phone: None,
        };

        // A different regular user may not touch the profile.
        assert!(matches!(
            service
                .update_profile(other.id, Role::User, owner.id, update())
                .await,
            Err(ApiError::Forbidden(_))
        ));

        // The user itself may.
        let updated = service
            .update_profile(owner.id, Role::User, owner.id, update())
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.phone, "02-2187000");

        // So may an admin, whoever they are.
        let updated = service
            .update_profile(other.id, Role::Admin, owner.id, update())
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn profile_update_of_missing_user_is_not_found() {
        let service = test_service().await;
        let ghost = Uuid::new_v4();

        assert!(matches!(
            service
                .update_profile(
                    ghost,
                    Role::Admin,
                    ghost,
                    ProfileUpdate {
                        name: Some("Ghost".into()),
                        email: None,
                        phone: None,
                    },
                )
                .await,
            Err(ApiError::NotFound(_))
        ));
    }
}
