//! User repository for database operations.
//!
//! Covers accounts, their one-to-one profile rows, and the opaque auth
//! tokens used as bearer credentials.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use bazaar_core::{Email, ProfileId, UserId, Username};

use super::RepositoryError;
use crate::models::user::{Profile, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(User {
            id: UserId::new(self.id),
            username,
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i32,
    user_id: i32,
    date_of_birth: Option<NaiveDate>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            user_id: UserId::new(row.user_id),
            date_of_birth: row.date_of_birth,
        }
    }
}

/// Repository for user, profile and token operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user and their profile row in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<(User, Profile), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, email, first_name, last_name, created_at, updated_at",
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let profile = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (user_id, date_of_birth) \
             VALUES ($1, $2) \
             RETURNING id, user_id, date_of_birth",
        )
        .bind(row.id)
        .bind(date_of_birth)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row.into_user()?, profile.into()))
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, first_name, last_name, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// Returns `None` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AuthRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, AuthRow>(
            "SELECT id, username, email, first_name, last_name, created_at, updated_at, \
                    password_hash \
             FROM users WHERE username = $1",
        )
        .bind(username.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.into_user()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Get a user's password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_password_hash(&self, id: UserId) -> Result<String, RepositoryError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        hash.map(|(h,)| h).ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Partially update account fields. `None` keeps the stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_account(
        &self,
        id: UserId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 email = COALESCE($4, email), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, username, email, first_name, last_name, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(first_name)
        .bind(last_name)
        .bind(email.map(Email::as_str))
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// Get a user's profile row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, user_id, date_of_birth FROM profiles WHERE user_id = $1",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Upsert a user's profile. A `None` date of birth keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_profile(
        &self,
        user_id: UserId,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (user_id, date_of_birth) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) \
             DO UPDATE SET date_of_birth = COALESCE($2, profiles.date_of_birth) \
             RETURNING id, user_id, date_of_birth",
        )
        .bind(user_id.as_i32())
        .bind(date_of_birth)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete a user. Profile, cart, tokens and orders cascade.
    ///
    /// Returns `true` if the user existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Auth tokens
    // =========================================================================

    /// Look up the user a token key belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_token(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.username, u.email, u.first_name, u.last_name, \
                    u.created_at, u.updated_at \
             FROM users u \
             JOIN auth_tokens t ON t.user_id = u.id \
             WHERE t.key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Return the user's existing token key, or store `fresh_key` as their
    /// token if they have none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_token(
        &self,
        user_id: UserId,
        fresh_key: &str,
    ) -> Result<String, RepositoryError> {
        // No-op upsert so the RETURNING clause yields the surviving key
        let (key,): (String,) = sqlx::query_as(
            "INSERT INTO auth_tokens (user_id, key) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = auth_tokens.user_id \
             RETURNING key",
        )
        .bind(user_id.as_i32())
        .bind(fresh_key)
        .fetch_one(self.pool)
        .await?;

        Ok(key)
    }

    /// Replace the user's token with `fresh_key`, invalidating the old one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rotate_token(
        &self,
        user_id: UserId,
        fresh_key: &str,
    ) -> Result<String, RepositoryError> {
        let (key,): (String,) = sqlx::query_as(
            "INSERT INTO auth_tokens (user_id, key) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET key = EXCLUDED.key, created_at = now() \
             RETURNING key",
        )
        .bind(user_id.as_i32())
        .bind(fresh_key)
        .fetch_one(self.pool)
        .await?;

        Ok(key)
    }

    /// Delete a token by its key (logout).
    ///
    /// Returns `true` if a token was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_token(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE key = $1")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
