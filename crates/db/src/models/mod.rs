//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod notification;
pub mod onboarding;
pub mod progress;
pub mod resource;
pub mod role;
pub mod session;
pub mod training;
pub mod user;
