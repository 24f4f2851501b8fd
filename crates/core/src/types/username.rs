//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too short.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("username may only contain letters, digits, '.', '-' and '_'")]
    InvalidCharacter,
    /// The input does not start with a letter or digit.
    #[error("username must start with a letter or digit")]
    InvalidFirstCharacter,
}

/// A login username.
///
/// ## Constraints
///
/// - Length: 3-32 characters
/// - ASCII letters, digits, `.`, `-` and `_` only
/// - Must start with a letter or digit
///
/// ## Examples
///
/// ```
/// use ticketslave_core::Username;
///
/// // Valid usernames
/// assert!(Username::parse("alice").is_ok());
/// assert!(Username::parse("build-bot_7").is_ok());
///
/// // Invalid usernames
/// assert!(Username::parse("").is_err());          // empty
/// assert!(Username::parse("ab").is_err());        // too short
/// assert!(Username::parse("a b").is_err());       // whitespace
/// assert!(Username::parse("-dash").is_err());     // bad first character
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length of a username.
    pub const MIN_LENGTH: usize = 3;

    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or shorter than 3 characters
    /// - Is longer than 32 characters
    /// - Contains characters outside `[A-Za-z0-9._-]`
    /// - Does not start with a letter or digit
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }

        if s.len() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(UsernameError::InvalidCharacter);
        }

        if !s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return Err(UsernameError::InvalidFirstCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
