//! Pure domain logic for the sales-ops onboarding and training service.
//!
//! Nothing in this crate touches the database or the network. The `db` and
//! `api` crates load rows, hand them to the functions here, and persist
//! whatever these functions decide.

pub mod error;
pub mod positions;
pub mod progress;
pub mod roles;
pub mod selector;
pub mod stats;
pub mod types;
pub mod validation;
