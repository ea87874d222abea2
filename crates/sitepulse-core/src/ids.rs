//! Identifier types for sitepulse.
//!
//! Visitor session tokens are generated by the browser and are opaque to the
//! server; counters row IDs are UUIDs minted by the server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of a visitor session token, in bytes.
pub const MAX_SESSION_TOKEN_LEN: usize = 128;

/// An opaque, client-generated visitor session token.
///
/// The token is trimmed on parse and must be non-empty and at most
/// [`MAX_SESSION_TOKEN_LEN`] bytes long.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorSessionId(String);

impl VisitorSessionId {
    /// Parse and validate a session token.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input and `IdError::TooLong` if the
    /// trimmed token exceeds [`MAX_SESSION_TOKEN_LEN`].
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let token = s.trim();
        if token.is_empty() {
            return Err(IdError::Empty);
        }
        if token.len() > MAX_SESSION_TOKEN_LEN {
            return Err(IdError::TooLong {
                max: MAX_SESSION_TOKEN_LEN,
                got: token.len(),
            });
        }
        Ok(Self(token.to_string()))
    }

    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the raw token bytes, used as the storage key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for VisitorSessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for VisitorSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisitorSessionId({})", self.0)
    }
}

impl fmt::Display for VisitorSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VisitorSessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VisitorSessionId> for String {
    fn from(id: VisitorSessionId) -> Self {
        id.0
    }
}

/// A 16-byte identifier for the aggregate counters row, based on UUID v4.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountersId(uuid::Uuid);

impl CountersId {
    /// Generate a new random `CountersId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the bytes of the UUID.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl FromStr for CountersId {
    type Err = IdError;

    /// Parse a `CountersId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s.trim()).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for CountersId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountersId({})", self.0)
    }
}

impl fmt::Display for CountersId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CountersId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountersId> for String {
    fn from(id: CountersId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty or only whitespace.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds the maximum length.
    #[error("identifier too long: max {max} bytes, got {got}")]
    TooLong {
        /// The maximum number of bytes.
        max: usize,
        /// The actual number of bytes.
        got: usize,
    },

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}
