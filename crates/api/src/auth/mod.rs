//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing, verification, strength check.
//! - [`jwt`] -- access-token signing/validation and refresh-token helpers.
//! - [`cookie`] -- the HttpOnly `session` cookie carrying the access token.

pub mod cookie;
pub mod jwt;
pub mod password;
