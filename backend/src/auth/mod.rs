//! Authentication and authorization subsystem.
//!
//! Token issuance/verification lives in [`token`], authority evaluation in
//! [`checker`], and the axum wiring in [`middleware`].

pub mod checker;
pub mod middleware;
pub mod models;
pub mod token;
