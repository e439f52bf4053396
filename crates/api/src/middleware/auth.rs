//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use salesdesk_core::error::CoreError;
use salesdesk_core::positions::Position;
use salesdesk_core::roles;
use salesdesk_core::selector::Viewer;
use salesdesk_core::types::DbId;

use crate::auth::cookie::session_token;
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
///
/// The token is taken from `Authorization: Bearer <token>` when present,
/// otherwise from the `session` cookie set at login.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Role name (`admin`, `manager`, `employee`).
    pub role: String,
    /// Position at the time the token was issued.
    pub position: Option<Position>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.role)
    }

    /// The caller as seen by the visibility rules.
    pub fn viewer(&self) -> Viewer {
        Viewer {
            position: self.position,
            is_admin: self.is_admin(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            Some(header) => header
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(
                        "Invalid Authorization format. Expected: Bearer <token>".into(),
                    ))
                })?,
            None => session_token(&parts.headers).ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header or session cookie".into(),
                ))
            })?,
        };

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        // An unrecognised position claim degrades to no position.
        let position = claims
            .position
            .as_deref()
            .and_then(|p| Position::from_str_value(p).ok());

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            position,
        })
    }
}
