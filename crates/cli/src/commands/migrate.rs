//! Database migration command.
//!
//! Applies the embedded SQL migrations from `crates/api/migrations/`. The
//! server never runs migrations on startup; this command is the only path.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use super::{CliError, database_url};

/// Run the API database migrations.
///
/// # Errors
///
/// Returns `CliError` if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), CliError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    info!("Migrations complete");
    Ok(())
}
