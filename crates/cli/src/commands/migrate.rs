//! Database migration command.

use ticketslave_server::config::ServerConfig;
use ticketslave_server::db;

use super::CommandError;

/// Create or upgrade the schema at the configured database path.
pub async fn run() -> Result<(), CommandError> {
    let config = ServerConfig::from_env()?;

    tracing::info!(path = %config.database_path.display(), "Connecting to database...");
    let pool = db::create_pool(&config.database_path).await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
