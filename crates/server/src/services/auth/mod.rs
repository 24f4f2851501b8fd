//! Authentication service.
//!
//! Password registration, login, password changes, and first-boot admin
//! seeding over the user repository.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::SqlitePool;

use ticketslave_core::{Role, Username};

use crate::db::users::UserRepository;
use crate::db::{RepositoryError, SettingsRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated credentials (seeded admin, CLI resets).
const GENERATED_PASSWORD_LENGTH: usize = 24;

/// A freshly seeded admin account and its one-time-visible password.
pub struct SeededAdmin {
    pub user: User,
    pub password: String,
}

/// Authentication service.
///
/// Handles user registration, login, and password management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    settings: SettingsRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
            settings: SettingsRepository::new(pool),
        }
    }

    /// Register a new user with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationDisabled` if the registration toggle
    /// is off.
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::DuplicateUser` if the username is already taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if !self.settings.allow_registration().await? {
            return Err(AuthError::RegistrationDisabled);
        }

        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&username, &password_hash, Role::Regular)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateUser,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// Unknown users and wrong passwords fail identically so the endpoint
    /// doesn't leak which usernames exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet requirements.
    pub async fn change_password(
        &self,
        username: &Username,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(current_password, &password_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &new_hash).await?;
        Ok(())
    }

    /// Reset a user's password to a freshly generated one (CLI recovery).
    ///
    /// Returns the new plaintext password exactly once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn reset_password(&self, username: &Username) -> Result<String, AuthError> {
        let user = self
            .users
            .get_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password = generate_password(GENERATED_PASSWORD_LENGTH);
        let hash = hash_password(&password)?;
        self.users.update_password(user.id, &hash).await?;
        Ok(password)
    }

    /// Seed the default admin on first boot.
    ///
    /// Only runs when the users table is empty. The password is randomly
    /// generated, never a fixed default; the caller is expected to log it
    /// once so the operator can complete setup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn ensure_admin(&self) -> Result<Option<SeededAdmin>, AuthError> {
        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let username = Username::parse("admin")?;
        let password = generate_password(GENERATED_PASSWORD_LENGTH);
        let password_hash = hash_password(&password)?;

        let user = self
            .users
            .create(&username, &password_hash, Role::Admin)
            .await
            .map_err(|e| match e {
                // Lost a boot race; another instance seeded the account.
                RepositoryError::Conflict(_) => AuthError::DuplicateUser,
                other => AuthError::Repository(other),
            })?;

        Ok(Some(SeededAdmin { user, password }))
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random alphanumeric password.
fn generate_password(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_password_length_and_charset() {
        let password = generate_password(24);
        assert_eq!(password.len(), 24);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth.register("alice", "password1").await.unwrap();
        assert_eq!(user.role, Role::Regular);

        let logged_in = auth.login("alice", "password1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            auth.login("alice", "password2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        auth.register("alice", "password1").await.unwrap();
        assert!(matches!(
            auth.register("alice", "password2").await,
            Err(AuthError::DuplicateUser)
        ));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        assert!(matches!(
            auth.register("alice", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_registration_toggle_enforced() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        SettingsRepository::new(&pool)
            .set_allow_registration(false)
            .await
            .unwrap();

        assert!(matches!(
            auth.register("alice", "password1").await,
            Err(AuthError::RegistrationDisabled)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth.register("alice", "password1").await.unwrap();
        assert!(matches!(
            auth.change_password(&user.username, "wrong", "password2").await,
            Err(AuthError::InvalidCredentials)
        ));

        auth.change_password(&user.username, "password1", "password2")
            .await
            .unwrap();
        assert!(auth.login("alice", "password2").await.is_ok());
        assert!(auth.login("alice", "password1").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_admin_seeds_once() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        let seeded = auth.ensure_admin().await.unwrap().expect("first boot seeds");
        assert_eq!(seeded.user.role, Role::Admin);
        assert_eq!(seeded.password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(auth.login("admin", &seeded.password).await.is_ok());

        // Second boot with users present: no new seed
        assert!(auth.ensure_admin().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_password() {
        let (pool, _tmp) = test_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth.register("alice", "password1").await.unwrap();
        let new_password = auth.reset_password(&user.username).await.unwrap();

        assert!(auth.login("alice", &new_password).await.is_ok());
        assert!(auth.login("alice", "password1").await.is_err());
    }
}
