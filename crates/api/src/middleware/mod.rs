//! Request middleware and extractors.

pub mod auth;

pub use auth::{OptionalAuth, RequireAuth, ensure_owner, token_from_headers};
