//! Domain services, each owning one slice of the system:
//! identities and credentials, the provider catalog, the booking ledger,
//! and the external travel-suggestion call.

pub mod booking_service;
pub mod catalog_service;
pub mod identity_service;
pub mod suggestion_service;
