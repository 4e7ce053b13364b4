//! Token authentication extractors.
//!
//! Clients authenticate with `Authorization: token <key>`. The key is an
//! opaque 40-character value handed out at login and looked up per request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use bazaar_core::UserId;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Pull the token key out of the `Authorization` header.
///
/// Fails closed: anything other than exactly two whitespace-separated parts
/// with a `token` scheme (case-insensitive) yields `None`.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let key = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    Some(key)
}

/// Extractor that requires a valid token.
///
/// Rejects with 401 when the header is missing, malformed, or the key
/// doesn't match any stored token.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("hello, {}", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = token_from_headers(&parts.headers).ok_or(AppError::Unauthenticated)?;

        let user = UserRepository::new(state.pool())
            .find_by_token(key)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self(user))
    }
}

/// Extractor that resolves the token if one is present and valid.
///
/// A missing or malformed header yields `None` rather than a rejection, so
/// guest traffic passes through.
pub struct OptionalAuth(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = token_from_headers(&parts.headers) else {
            return Ok(Self(None));
        };

        let user = UserRepository::new(state.pool()).find_by_token(key).await?;
        Ok(Self(user))
    }
}

/// Single owner predicate shared by every owner-gated mutation.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if `user` doesn't own the resource.
pub fn ensure_owner(user: &User, owner: UserId, what: &str) -> Result<(), AppError> {
    if user.id == owner {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only the owner can modify this {what}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_well_formed_header_yields_key() {
        let headers = headers_with_auth("token abc123");
        assert_eq!(token_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let headers = headers_with_auth("Token abc123");
        assert_eq!(token_from_headers(&headers), Some("abc123"));
        let headers = headers_with_auth("TOKEN abc123");
        assert_eq!(token_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn test_missing_header_fails_closed() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme_fails_closed() {
        let headers = headers_with_auth("Bearer abc123");
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let headers = headers_with_auth("token");
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_extra_parts_fail_closed() {
        let headers = headers_with_auth("token abc123 extra");
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_empty_header_fails_closed() {
        let headers = headers_with_auth("");
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_whitespace_only_header_fails_closed() {
        let headers = headers_with_auth("   ");
        assert_eq!(token_from_headers(&headers), None);
    }
}
