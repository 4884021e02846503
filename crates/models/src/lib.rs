//! Record types persisted by the user store and their JSON wire format.

pub mod errors;
pub mod user;
