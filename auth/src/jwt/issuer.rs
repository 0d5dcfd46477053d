use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::AccessClaims;
use super::claims::AccessSubject;
use super::claims::RefreshClaims;
use super::errors::TokenError;

/// Configuration for the token issuer.
///
/// The access and refresh secrets must differ so that possession of one
/// token type can never be used to forge the other.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Signs and verifies access and refresh tokens.
///
/// Holds one HS256 key pair per token kind. Issuance and verification are
/// pure cryptographic operations with no side effects.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    algorithm: Algorithm,
}

impl TokenIssuer {
    /// Create an issuer from explicit configuration.
    ///
    /// # Security Notes
    /// - Each secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(config: TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a short-lived access token for the given subject.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue_access(&self, subject: &AccessSubject) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: subject.id.clone(),
            username: subject.username.clone(),
            email: subject.email.clone(),
            full_name: subject.full_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        self.sign(&claims, &self.access_encoding)
    }

    /// Issue a long-lived refresh token carrying only the account id.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue_refresh(&self, account_id: impl ToString) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        self.sign(&claims, &self.refresh_encoding)
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiry
    /// * `InvalidSignature` - Tampered, or signed with a different key
    /// * `Malformed` - Not a parseable token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode_claims(token, &self.access_decoding)
    }

    /// Verify a refresh token and return its claims.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiry
    /// * `InvalidSignature` - Tampered, or signed with a different key
    /// * `Malformed` - Not a parseable token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode_claims(token, &self.refresh_decoding)
    }

    fn sign<T: Serialize>(&self, claims: &T, key: &EncodingKey) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, key).map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    fn decode_claims<T: DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<T, TokenError> {
        let validation = Validation::new(self.algorithm);

        let token_data = decode::<T>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(e.to_string()),
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig {
            access_secret: "access_secret_at_least_32_bytes_long!".to_string(),
            refresh_secret: "refresh_secret_at_least_32_bytes_ok!".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(10),
        }
    }

    fn test_subject() -> AccessSubject {
        AccessSubject {
            id: "account-1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice A".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_access() {
        let issuer = TokenIssuer::new(test_config());

        let token = issuer
            .issue_access(&test_subject())
            .expect("Failed to issue access token");
        assert!(!token.is_empty());

        let claims = issuer
            .verify_access(&token)
            .expect("Failed to verify access token");
        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_issue_and_verify_refresh() {
        let issuer = TokenIssuer::new(test_config());

        let token = issuer
            .issue_refresh("account-1")
            .expect("Failed to issue refresh token");

        let claims = issuer
            .verify_refresh(&token)
            .expect("Failed to verify refresh token");
        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.exp - claims.iat, 10 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_access_token_rejected() {
        // TTL far enough in the past to clear the default validation leeway
        let mut config = test_config();
        config.access_ttl = Duration::minutes(-5);
        let issuer = TokenIssuer::new(config);

        let token = issuer.issue_access(&test_subject()).unwrap();
        let result = issuer.verify_access(&token);
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_refresh_token_rejected() {
        let mut config = test_config();
        config.refresh_ttl = Duration::minutes(-5);
        let issuer = TokenIssuer::new(config);

        let token = issuer.issue_refresh("account-1").unwrap();
        let result = issuer.verify_refresh(&token);
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_access_token_does_not_verify_as_refresh() {
        let issuer = TokenIssuer::new(test_config());

        let access = issuer.issue_access(&test_subject()).unwrap();
        let result = issuer.verify_refresh(&access);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_refresh_token_does_not_verify_as_access() {
        let issuer = TokenIssuer::new(test_config());

        let refresh = issuer.issue_refresh("account-1").unwrap();
        let result = issuer.verify_access(&refresh);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_token_from_different_secret_rejected() {
        let issuer1 = TokenIssuer::new(test_config());

        let mut other = test_config();
        other.access_secret = "another_access_secret_32_bytes_long!".to_string();
        let issuer2 = TokenIssuer::new(other);

        let token = issuer1.issue_access(&test_subject()).unwrap();
        let result = issuer2.verify_access(&token);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let issuer = TokenIssuer::new(test_config());

        let result = issuer.verify_access("not.a.token");
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }
}
