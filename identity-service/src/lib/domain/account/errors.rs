use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for media store operations
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Failed to store asset: {0}")]
    StoreFailed(String),
}

/// Top-level error for all account and session operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    // Domain-level errors
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    /// Wrong password or unknown identifier. Deliberately a single variant
    /// so the API cannot act as an account-existence oracle.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token failed verification, no longer matches the stored
    /// slot, or the account is gone. One variant for all of them.
    #[error("Refresh token is expired or already used")]
    SessionExpired,

    #[error("Avatar file is required")]
    MissingAvatar,

    #[error("Asset upload failed: {0}")]
    UploadFailed(String),

    // Infrastructure errors
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<MediaError> for AccountError {
    fn from(err: MediaError) -> Self {
        AccountError::UploadFailed(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        AccountError::Unknown(err.to_string())
    }
}
