//! Caller identity for preference routes.
//!
//! Authentication happens upstream; the gateway forwards the caller's user id
//! in a trusted header. [`identify_user`] turns that header into a [`UserId`]
//! request extension and [`CurrentUser`] hands it to handlers.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderName, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use user_preferences_sdk::UserId;
use uuid::Uuid;

use super::error::unauthenticated_problem;
use super::problem::Problem;

/// Name of the header carrying the authenticated user id.
#[derive(Debug, Clone)]
pub struct IdentityHeader(pub HeaderName);

impl IdentityHeader {
    /// # Errors
    /// Returns an error if `name` is not a valid HTTP header name.
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        let header = HeaderName::try_from(name)
            .map_err(|e| anyhow::anyhow!("invalid identity header name '{name}': {e}"))?;
        Ok(Self(header))
    }
}

/// Extractor for the caller's [`UserId`], set by [`identify_user`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserId>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| unauthenticated_problem("Caller identity is not available"))
    }
}

/// Middleware resolving the caller from the identity header.
///
/// Missing or malformed identities are rejected with 401 before the handler runs.
pub async fn identify_user(
    State(IdentityHeader(header)): State<IdentityHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_user_id(request.headers(), &header) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(detail) => {
            tracing::debug!(header = %header, reason = detail, "Rejecting unidentified request");
            unauthenticated_problem(detail)
                .with_instance(request.uri().path())
                .into_response()
        }
    }
}

fn extract_user_id(headers: &HeaderMap, header: &HeaderName) -> Result<UserId, &'static str> {
    let raw = headers
        .get(header)
        .ok_or("Missing caller identity header")?
        .to_str()
        .map_err(|_| "Caller identity header is not valid text")?;

    Uuid::parse_str(raw.trim())
        .map(UserId::new)
        .map_err(|_| "Caller identity header is not a valid user id")
}
