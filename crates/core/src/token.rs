//! Token types and authorization.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Unique identifier for a token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(Uuid);

impl TokenId {
    /// Generate a new random token ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::Serialization(format!("invalid token ID: {e}")))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token scopes for authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenScope {
    /// Read access (fetch documentation files and archives).
    #[serde(rename = "docs:read")]
    DocsRead,
    /// Write access (upload documentation archives).
    #[serde(rename = "docs:write")]
    DocsWrite,
    /// Admin access (tokens, backup, restore).
    #[serde(rename = "docs:admin")]
    DocsAdmin,
}

impl TokenScope {
    /// Parse from string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "docs:read" => Ok(Self::DocsRead),
            "docs:write" => Ok(Self::DocsWrite),
            "docs:admin" => Ok(Self::DocsAdmin),
            _ => Err(crate::Error::Serialization(format!("unknown scope: {s}"))),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocsRead => "docs:read",
            Self::DocsWrite => "docs:write",
            Self::DocsAdmin => "docs:admin",
        }
    }

    /// Check if this scope implies another scope.
    pub fn implies(&self, other: &Self) -> bool {
        match self {
            Self::DocsAdmin => true, // Admin implies all
            Self::DocsWrite => matches!(other, Self::DocsWrite | Self::DocsRead),
            Self::DocsRead => matches!(other, Self::DocsRead),
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated token with its metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Token identifier.
    pub id: TokenId,
    /// Granted scopes.
    pub scopes: HashSet<TokenScope>,
    /// When the token expires.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    /// When the token was revoked (if revoked).
    #[serde(with = "time::serde::rfc3339::option")]
    pub revoked_at: Option<OffsetDateTime>,
    /// When the token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Description for the token.
    pub description: Option<String>,
}

impl Token {
    /// Check if the token is valid (not expired or revoked).
    pub fn is_valid(&self) -> bool {
        let now = OffsetDateTime::now_utc();

        if self.revoked_at.is_some() {
            return false;
        }

        if let Some(expires_at) = self.expires_at
            && now > expires_at
        {
            return false;
        }

        true
    }

    /// Check if the token has a specific scope.
    pub fn has_scope(&self, scope: TokenScope) -> bool {
        self.scopes.iter().any(|s| s.implies(&scope))
    }
}

/// Request to create a token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    /// Scopes to grant.
    pub scopes: Vec<String>,
    /// Expiration duration in seconds (optional).
    pub expires_in_secs: Option<u64>,
    /// Description for the token.
    pub description: Option<String>,
}

/// Response from creating a token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    /// The token ID.
    pub token_id: String,
    /// The token secret (only returned once).
    pub token_secret: String,
    /// When the token expires.
    pub expires_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_implies() {
        assert!(TokenScope::DocsAdmin.implies(&TokenScope::DocsRead));
        assert!(TokenScope::DocsAdmin.implies(&TokenScope::DocsWrite));
        assert!(TokenScope::DocsAdmin.implies(&TokenScope::DocsAdmin));

        assert!(TokenScope::DocsWrite.implies(&TokenScope::DocsRead));
        assert!(!TokenScope::DocsWrite.implies(&TokenScope::DocsAdmin));

        assert!(TokenScope::DocsRead.implies(&TokenScope::DocsRead));
        assert!(!TokenScope::DocsRead.implies(&TokenScope::DocsWrite));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(TokenScope::parse("docs:read").unwrap(), TokenScope::DocsRead);
        assert_eq!(
            TokenScope::parse("docs:write").unwrap(),
            TokenScope::DocsWrite
        );
        assert_eq!(
            TokenScope::parse("docs:admin").unwrap(),
            TokenScope::DocsAdmin
        );
        assert!(TokenScope::parse("invalid").is_err());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let now = OffsetDateTime::now_utc();
        let token = Token {
            id: TokenId::new(),
            scopes: HashSet::from([TokenScope::DocsRead]),
            expires_at: Some(now - time::Duration::seconds(1)),
            revoked_at: None,
            created_at: now - time::Duration::hours(1),
            description: None,
        };
        assert!(!token.is_valid());
    }
}
