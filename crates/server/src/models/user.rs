//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ticketslave_core::{Role, UserId, Username};

/// A registered account (domain type).
///
/// The password hash deliberately lives outside this type; handlers can
/// serialize a `User` without leaking credentials.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across the system.
    pub username: Username,
    /// Permission level.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
