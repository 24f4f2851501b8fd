//! Account recovery commands.

use ticketslave_core::Username;
use ticketslave_server::config::ServerConfig;
use ticketslave_server::db;
use ticketslave_server::services::AuthService;

use super::CommandError;

/// Rotate a user's password to a freshly generated one and print it.
///
/// This is the recovery path when the seeded admin password is lost; the
/// plaintext is shown exactly once.
#[allow(clippy::print_stdout)]
pub async fn reset_password(username: &str) -> Result<(), CommandError> {
    let username = Username::parse(username)?;

    let config = ServerConfig::from_env()?;
    let pool = db::create_pool(&config.database_path).await?;
    db::MIGRATOR.run(&pool).await?;

    let password = AuthService::new(&pool).reset_password(&username).await?;

    println!("New password for '{username}': {password}");
    println!("Log in and change it immediately.");
    Ok(())
}
