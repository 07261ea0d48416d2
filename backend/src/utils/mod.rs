//! Utility modules shared across the backend.

pub mod password;
