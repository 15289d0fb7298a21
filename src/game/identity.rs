//! Player Identity
//!
//! Externally verified identifier (an email address) keying the nonce store.
//! Ord is derived so stores can use BTreeMap for deterministic iteration.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique player identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerIdentity(String);

/// Identity parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Not a syntactically plausible email address.
    #[error("invalid email format: {0:?}")]
    InvalidFormat(String),
}

impl PlayerIdentity {
    /// Parse and normalize an email identity.
    ///
    /// Trims surrounding whitespace and lowercases. Requires exactly one `@`,
    /// a non-empty local part, and a dotted domain with no empty labels.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let email = raw.trim().to_ascii_lowercase();
        let invalid = || IdentityError::InvalidFormat(raw.to_string());

        if email.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(invalid());
        }

        Ok(Self(email))
    }

    /// Normalized identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerIdentity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerIdentity> for String {
    fn from(identity: PlayerIdentity) -> Self {
        identity.0
    }
}

impl std::str::FromStr for PlayerIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
