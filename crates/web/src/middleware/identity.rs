use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::WebError;
use crate::state::AppState;

/// Username verified by the authentication layer in front of this service
/// and forwarded in the configured identity header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(&state.identity_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(WebError::Unauthorized)?;

        Ok(Self(username.to_string()))
    }
}
