//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for the identity service:
//! - Password hashing (Argon2id)
//! - Dual-key JWT issuance and verification (access + refresh tokens)
//!
//! The service defines its own domain ports and adapts these implementations.
//! Everything here is pure computation: no I/O, no persistence.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Token Issuance
//! ```
//! use auth::{AccessSubject, TokenConfig, TokenIssuer};
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(TokenConfig {
//!     access_secret: "access_secret_at_least_32_bytes_long!".to_string(),
//!     refresh_secret: "refresh_secret_at_least_32_bytes_ok!".to_string(),
//!     access_ttl: Duration::minutes(15),
//!     refresh_ttl: Duration::days(10),
//! });
//!
//! let subject = AccessSubject {
//!     id: "account-1".to_string(),
//!     username: "alice".to_string(),
//!     email: "alice@example.com".to_string(),
//!     full_name: "Alice A".to_string(),
//! };
//!
//! let access = issuer.issue_access(&subject).unwrap();
//! let claims = issuer.verify_access(&access).unwrap();
//! assert_eq!(claims.sub, "account-1");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::AccessClaims;
pub use jwt::AccessSubject;
pub use jwt::RefreshClaims;
pub use jwt::TokenConfig;
pub use jwt::TokenError;
pub use jwt::TokenIssuer;
pub use password::PasswordError;
pub use password::PasswordHasher;
