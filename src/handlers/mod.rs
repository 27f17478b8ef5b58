//! HTTP handlers, one module per resource. Handlers translate domain
//! outcomes into the `{success, data?, count?, pagination?, message?}`
//! JSON envelope and leave the actual rules to the services.

pub mod auth_handlers;
pub mod booking_handlers;
pub mod health_handlers;
pub mod provider_handlers;
