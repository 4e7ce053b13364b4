//! Account service.
//!
//! Registration, credential checks and profile maintenance for shop
//! accounts. Authentication is username + password; a successful login
//! hands out an opaque token key stored server-side.

mod error;

pub use error::AccountError;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use chrono::NaiveDate;
use rand::RngCore;
use sqlx::PgPool;

use bazaar_core::{Email, UserId, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{Profile, User};

/// Minimum accepted password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of a token key in bytes of entropy (hex-encoded to twice this).
const TOKEN_KEY_BYTES: usize = 20;

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns `AccountError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AccountError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// # Errors
///
/// Returns `AccountError::PasswordHash` if the stored hash is unparseable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AccountError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Generate a fresh token key: 20 random bytes, lowercase hex.
#[must_use]
pub fn generate_token_key() -> String {
    use std::fmt::Write as _;

    let mut bytes = [0u8; TOKEN_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let mut key = String::with_capacity(TOKEN_KEY_BYTES * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(key, "{b:02x}");
    }
    key
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Account service over the user repository.
pub struct AccountService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account with its profile row.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidUsername` / `InvalidEmail` /
    /// `WeakPassword` on validation failure and `UsernameTaken` if the
    /// username already exists.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<(User, Profile), AccountError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let result = self
            .users
            .create(&username, &email, &password_hash, date_of_birth)
            .await;

        match result {
            Ok(pair) => Ok(pair),
            Err(RepositoryError::Conflict(_)) => Err(AccountError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and return the account's token key.
    ///
    /// The key is stable across logins; it only changes when the password
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` on any mismatch. A
    /// malformed username is treated the same as an unknown one.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let Ok(username) = Username::parse(username) else {
            return Err(AccountError::InvalidCredentials);
        };

        let Some((user, password_hash)) = self.users.get_with_password_hash(&username).await?
        else {
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(password, &password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }

        let key = self
            .users
            .get_or_create_token(user.id, &generate_token_key())
            .await?;
        Ok(key)
    }

    /// Change a password, rotating the account's token. Returns the new key.
    ///
    /// The mismatch check runs before any state changes, so a failed call
    /// leaves both the password and the token untouched.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::PasswordMismatch` if the new passwords differ,
    /// `WrongOldPassword` if the old one doesn't verify, and `WeakPassword`
    /// if the new one fails the policy.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password1: &str,
        new_password2: &str,
    ) -> Result<String, AccountError> {
        if new_password1 != new_password2 {
            return Err(AccountError::PasswordMismatch);
        }
        validate_password(new_password1)?;

        let stored_hash = match self.users.get_password_hash(user_id).await {
            Ok(hash) => hash,
            Err(RepositoryError::NotFound) => return Err(AccountError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        if !verify_password(old_password, &stored_hash)? {
            return Err(AccountError::WrongOldPassword);
        }

        let new_hash = hash_password(new_password1)?;
        self.users.set_password_hash(user_id, &new_hash).await?;

        // Old token keys stop working immediately
        let key = self
            .users
            .rotate_token(user_id, &generate_token_key())
            .await?;

        Ok(key)
    }

    /// Partially update account fields and the profile's date of birth.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` if a new email is malformed and
    /// `UserNotFound` if the account no longer exists.
    pub async fn update_account(
        &self,
        user_id: UserId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<(User, Profile), AccountError> {
        let email = email.map(Email::parse).transpose()?;

        let user = match self
            .users
            .update_account(user_id, first_name, last_name, email.as_ref())
            .await
        {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => return Err(AccountError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        let profile = self.users.upsert_profile(user_id, date_of_birth).await?;

        Ok((user, profile))
    }

    /// Delete an account. Profile, tokens, cart and orders cascade.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account doesn't exist.
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), AccountError> {
        if !self.users.delete(user_id).await? {
            return Err(AccountError::UserNotFound);
        }
        Ok(())
    }

    /// Invalidate a token key (logout). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the delete fails.
    pub async fn logout(&self, token_key: &str) -> Result<(), AccountError> {
        self.users.delete_token(token_key).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_is_40_lowercase_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_token_keys_are_unique() {
        assert_ne!(generate_token_key(), generate_token_key());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let err = validate_password("1234567").unwrap_err();
        assert!(matches!(err, AccountError::WeakPassword(_)));
        validate_password("12345678").unwrap();
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_internal_error() {
        let err = verify_password("anything", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AccountError::PasswordHash));
    }
}
