//! Core data models for the booking management service.
//!
//! These entities represent users, service providers, and the bookings
//! linking them. They map cleanly to database tables via `sqlx::FromRow`
//! and serialize naturally as JSON via `serde`.

pub mod booking;
pub mod provider;
pub mod user;
