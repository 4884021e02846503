//! Shared process-level helpers for the user store binaries and tests.

pub mod utils;
