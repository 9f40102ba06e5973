//! Bearer-token authentication resolved against the configured token directory.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use shelf_authz::Principal;
use shelf_kernel::AppContext;

use crate::error::AppError;

/// The principal behind a request, or `None` for an anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub Option<Principal>);

impl Actor {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|p| p.username.as_str())
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts the `Bearer` and `Token` schemes, case-insensitively.
pub fn parse_credentials(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    (known && !token.is_empty() && !token.contains(' ')).then_some(token)
}

impl<S> FromRequestParts<S> for Actor
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Actor::anonymous());
        };

        let token = header
            .to_str()
            .ok()
            .and_then(parse_credentials)
            .ok_or_else(|| AppError::unauthorized("Invalid token header."))?;

        let ctx = AppContext::from_ref(state);
        match ctx.tokens.authenticate(token) {
            Some(principal) => {
                tracing::debug!(user = %principal.username, role = principal.role.as_str(), "authenticated");
                Ok(Actor(Some(principal.clone())))
            }
            None => {
                tracing::warn!("rejected unknown token");
                Err(AppError::unauthorized("Invalid token."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_token_schemes_are_accepted() {
        assert_eq!(parse_credentials("Bearer abc"), Some("abc"));
        assert_eq!(parse_credentials("token abc"), Some("abc"));
        assert_eq!(parse_credentials("  BEARER   abc "), Some("abc"));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(parse_credentials("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_credentials("Bearer"), None);
        assert_eq!(parse_credentials("Bearer a b"), None);
        assert_eq!(parse_credentials(""), None);
    }
}
