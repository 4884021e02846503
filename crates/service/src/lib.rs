//! Data-access layer of the user store.
//! - `store`: connection-managed, namespaced key-value client.
//! - `user_service`: CRUD over JSON user records on top of the client.
//! - `readiness`: bootstrap polling, kept out of the client itself.

pub mod errors;
pub mod readiness;
pub mod store;
pub mod user_service;
