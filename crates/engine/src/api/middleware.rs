use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::{AdminAuth, Claims};
use crate::error::AuthError;

/// Proof that the request carried a valid admin token.
///
/// Add it as a handler argument to guard a route.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    Arc<AdminAuth>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;

        let auth = Arc::<AdminAuth>::from_ref(state);
        let claims = auth.verify(token).inspect_err(|e| {
            tracing::warn!(path = %parts.uri.path(), "Admin token rejected: {}", e);
        })?;

        Ok(AdminSession { claims })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}
