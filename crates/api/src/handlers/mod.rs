//! Request handlers, one submodule per resource.
//!
//! Handlers validate input, delegate persistence to the repositories in
//! `salesdesk_db` and pure decisions to `salesdesk_core`, and map errors via
//! [`AppError`](crate::error::AppError).

pub mod admin;
pub mod auth;
pub mod notification;
pub mod onboarding;
pub mod progress;
pub mod training;
