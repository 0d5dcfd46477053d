use serde::Deserialize;
use serde::Serialize;

/// Claims carried by a short-lived access token.
///
/// Embeds denormalized profile fields so request handling does not need a
/// database round trip just to render the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (account identifier)
    pub sub: String,

    pub username: String,

    pub email: String,

    pub full_name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims carried by a long-lived refresh token.
///
/// Intentionally minimal: only the account identifier and the standard
/// timestamps. Possession alone is not sufficient to refresh a session;
/// the service compares the token against the copy it stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Subject (account identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Profile snapshot embedded into a freshly issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSubject {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
}
