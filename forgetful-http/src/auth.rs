//! `Authorization: Bearer <token>` extraction.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use forgetful_core::error::Error;
use forgetful_core::types::UserId;

/// Extractor yielding the authenticated user for a request, via
/// [`crate::state::ResolveUser`].
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");

        let user_id = state.resolve_user.resolve(token).await.map_err(|err| {
            if matches!(err, Error::PermissionDenied { .. }) {
                ApiError(err)
            } else {
                ApiError(Error::PermissionDenied {
                    required_scope: "authenticated".to_string(),
                })
            }
        })?;
        Ok(AuthenticatedUser(user_id))
    }
}
