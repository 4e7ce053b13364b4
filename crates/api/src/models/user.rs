//! User and profile domain types.

use bazaar_core::{Email, ProfileId, UserId, Username};
use chrono::{DateTime, NaiveDate, Utc};

/// A registered user.
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Contact email address.
    pub email: Email,
    /// Given name (may be empty).
    pub first_name: String,
    /// Family name (may be empty).
    pub last_name: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Extra per-user data, one row per user.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Database ID of this profile.
    pub id: ProfileId,
    /// User this profile belongs to.
    pub user_id: UserId,
    /// Date of birth, if the user provided one.
    pub date_of_birth: Option<NaiveDate>,
}
