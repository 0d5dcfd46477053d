use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use auth::AccessSubject;
use auth::PasswordHasher;
use auth::TokenIssuer;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedSession;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::IdentityServicePort;
use crate::account::ports::MediaStore;

/// Domain service implementation for identity and session operations.
///
/// All session state lives in the repository; this type holds no mutable
/// state of its own, so concurrent requests need no in-process
/// coordination. The single atomicity point, refresh rotation, is
/// delegated to `AccountRepository::rotate_refresh_token`.
pub struct IdentityService<AR, MS>
where
    AR: AccountRepository,
    MS: MediaStore,
{
    repository: Arc<AR>,
    media_store: Arc<MS>,
    token_issuer: Arc<TokenIssuer>,
    password_hasher: PasswordHasher,
}

impl<AR, MS> IdentityService<AR, MS>
where
    AR: AccountRepository,
    MS: MediaStore,
{
    pub fn new(repository: Arc<AR>, media_store: Arc<MS>, token_issuer: Arc<TokenIssuer>) -> Self {
        Self {
            repository,
            media_store,
            token_issuer,
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Issue a fresh access/refresh pair for the account. Pure token work;
    /// persisting the refresh token is the caller's job.
    fn issue_session(&self, account: &Account) -> Result<AuthenticatedSession, AccountError> {
        let subject = AccessSubject {
            id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            full_name: account.full_name.clone(),
        };

        let access_token = self
            .token_issuer
            .issue_access(&subject)
            .map_err(|e| AccountError::Crypto(format!("Access token issuance failed: {}", e)))?;
        let refresh_token = self
            .token_issuer
            .issue_refresh(account.id)
            .map_err(|e| AccountError::Crypto(format!("Refresh token issuance failed: {}", e)))?;

        Ok(AuthenticatedSession {
            account: account.clone(),
            access_token,
            refresh_token,
        })
    }

    async fn store_upload(&self, upload: &Path) -> Result<String, AccountError> {
        let stored = self.media_store.store(upload).await;
        remove_upload(upload).await;
        stored.map_err(AccountError::from)
    }
}

/// Best-effort removal of a temp upload file. Missing files are fine;
/// anything else is logged and swallowed so cleanup never masks the
/// error that triggered it.
async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove temp upload file"
            );
        }
    }
}

#[async_trait]
impl<AR, MS> IdentityServicePort for IdentityService<AR, MS>
where
    AR: AccountRepository,
    MS: MediaStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError> {
        // Duplicate check first: no uploads may outlive a failed registration
        if let Some(existing) = self
            .repository
            .find_by_username_or_email(&command.username, &command.email)
            .await?
        {
            remove_upload(&command.avatar).await;
            if let Some(cover) = &command.cover_image {
                remove_upload(cover).await;
            }
            return Err(if existing.username == command.username {
                AccountError::UsernameAlreadyExists(command.username.to_string())
            } else {
                AccountError::EmailAlreadyExists(command.email.to_string())
            });
        }

        let avatar_url = self.store_upload(&command.avatar).await?;

        // Cover upload is optional: failure here degrades to an empty URL
        let cover_image_url = match &command.cover_image {
            Some(path) => match self.store_upload(path).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(error = %e, "Cover image upload failed, continuing without cover");
                    String::new()
                }
            },
            None => String::new(),
        };

        let password_hash = self
            .password_hasher
            .hash(&command.password)
            .map_err(|e| AccountError::Crypto(format!("Password hashing failed: {}", e)))?;

        let account = Account {
            id: AccountId::new(),
            username: command.username,
            email: command.email,
            full_name: command.full_name,
            password_hash,
            avatar_url,
            cover_image_url,
            refresh_token: None,
            created_at: Utc::now(),
        };

        let created = self.repository.create(account).await?;

        tracing::info!(account_id = %created.id, username = %created.username, "Account registered");

        Ok(created)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AccountError> {
        // Unknown identifier and wrong password collapse into the same
        // error so responses cannot leak which one it was
        let account = self
            .repository
            .find_by_identifier(&command.identifier)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let valid = self
            .password_hasher
            .verify(&command.password, &account.password_hash)
            .map_err(|e| AccountError::Crypto(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AccountError::InvalidCredentials);
        }

        let session = self.issue_session(&account)?;

        // Overwrites any previously stored refresh token: newest login wins
        self.repository
            .set_refresh_token(&account.id, Some(&session.refresh_token))
            .await?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(session)
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<AuthenticatedSession, AccountError> {
        let claims = self
            .token_issuer
            .verify_refresh(refresh_token)
            .map_err(|e| {
                tracing::warn!(error = %e, "Refresh token verification failed");
                AccountError::SessionExpired
            })?;

        let account_id =
            AccountId::from_string(&claims.sub).map_err(|_| AccountError::SessionExpired)?;

        let account = self
            .repository
            .find_by_id(&account_id)
            .await?
            .ok_or(AccountError::SessionExpired)?;

        let session = self.issue_session(&account)?;

        // Atomic compare-and-swap against the stored slot: the incoming
        // token must still be the live one, and at most one concurrent
        // refresh can win the rotation
        let rotated = self
            .repository
            .rotate_refresh_token(&account.id, refresh_token, &session.refresh_token)
            .await?;
        if !rotated {
            tracing::warn!(account_id = %account.id, "Refresh token reuse detected");
            return Err(AccountError::SessionExpired);
        }

        Ok(session)
    }

    async fn logout(&self, id: &AccountId) -> Result<(), AccountError> {
        self.repository.set_refresh_token(id, None).await?;
        tracing::info!(account_id = %id, "Logged out");
        Ok(())
    }

    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError> {
        let account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))?;

        let valid = self
            .password_hasher
            .verify(&command.old_password, &account.password_hash)
            .map_err(|e| AccountError::Crypto(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AccountError::InvalidCredentials);
        }

        let new_hash = self
            .password_hasher
            .hash(&command.new_password)
            .map_err(|e| AccountError::Crypto(format!("Password hashing failed: {}", e)))?;

        // Writes the hash and clears the refresh token slot together, so a
        // password change also ends the current session
        self.repository.update_password_hash(id, &new_hash).await?;

        tracing::info!(account_id = %id, "Password changed, session revoked");

        Ok(())
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError> {
        self.repository
            .update_profile(id, command.full_name.as_deref(), command.email.as_ref())
            .await
    }

    async fn update_avatar(&self, id: &AccountId, upload: &Path) -> Result<Account, AccountError> {
        let url = self.store_upload(upload).await?;
        self.repository.update_avatar_url(id, &url).await
    }

    async fn update_cover_image(
        &self,
        id: &AccountId,
        upload: &Path,
    ) -> Result<Account, AccountError> {
        let url = self.store_upload(upload).await?;
        self.repository.update_cover_url(id, &url).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use auth::TokenConfig;
    use chrono::Duration;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::account::errors::MediaError;
    use crate::account::models::EmailAddress;
    use crate::account::models::Username;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn create(&self, account: Account) -> Result<Account, AccountError>;
            async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
            async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, AccountError>;
            async fn find_by_username_or_email(
                &self,
                username: &Username,
                email: &EmailAddress,
            ) -> Result<Option<Account>, AccountError>;
            async fn set_refresh_token<'a>(&self, id: &AccountId, token: Option<&'a str>) -> Result<(), AccountError>;
            async fn rotate_refresh_token(&self, id: &AccountId, current: &str, next: &str) -> Result<bool, AccountError>;
            async fn update_password_hash(&self, id: &AccountId, password_hash: &str) -> Result<(), AccountError>;
            async fn update_profile<'a>(
                &self,
                id: &AccountId,
                full_name: Option<&'a str>,
                email: Option<&'a EmailAddress>,
            ) -> Result<Account, AccountError>;
            async fn update_avatar_url(&self, id: &AccountId, url: &str) -> Result<Account, AccountError>;
            async fn update_cover_url(&self, id: &AccountId, url: &str) -> Result<Account, AccountError>;
        }
    }

    mock! {
        pub TestMediaStore {}

        #[async_trait]
        impl MediaStore for TestMediaStore {
            async fn store(&self, local_path: &Path) -> Result<String, MediaError>;
        }
    }

    fn test_issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(TokenConfig {
            access_secret: "access_secret_at_least_32_bytes_long!".to_string(),
            refresh_secret: "refresh_secret_at_least_32_bytes_ok!".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(10),
        }))
    }

    fn test_service(
        repository: MockTestAccountRepository,
        media_store: MockTestMediaStore,
    ) -> IdentityService<MockTestAccountRepository, MockTestMediaStore> {
        IdentityService::new(Arc::new(repository), Arc::new(media_store), test_issuer())
    }

    fn test_account() -> Account {
        let hasher = PasswordHasher::new();
        Account {
            id: AccountId::new(),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            full_name: "Alice A".to_string(),
            password_hash: hasher.hash("secret123").unwrap(),
            avatar_url: "http://media.local/avatar.png".to_string(),
            cover_image_url: String::new(),
            refresh_token: None,
            created_at: Utc::now(),
        }
    }

    async fn temp_upload(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        tokio::fs::write(&path, b"fake image bytes").await.unwrap();
        path
    }

    fn register_command(avatar: PathBuf, cover: Option<PathBuf>) -> RegisterCommand {
        RegisterCommand {
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            full_name: "Alice A".to_string(),
            password: "secret123".to_string(),
            avatar,
            cover_image: cover,
        }
    }

    #[tokio::test]
    async fn test_register_success_never_stores_plaintext() {
        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();

        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(|_, _| Ok(None));
        media_store
            .expect_store()
            .times(1)
            .returning(|_| Ok("http://media.local/stored.png".to_string()));
        repository
            .expect_create()
            .withf(|account| {
                account.username.as_str() == "alice"
                    && account.password_hash.starts_with("$argon2")
                    && !account.password_hash.contains("secret123")
                    && account.refresh_token.is_none()
                    && account.avatar_url == "http://media.local/stored.png"
            })
            .times(1)
            .returning(|account| Ok(account));

        let avatar = temp_upload("avatar.png").await;
        let service = test_service(repository, media_store);

        let created = service
            .register(register_command(avatar.clone(), None))
            .await
            .expect("Registration failed");

        assert!(PasswordHasher::new()
            .verify("secret123", &created.password_hash)
            .unwrap());
        // Temp upload removed after the media store took its copy
        assert!(!avatar.exists());
    }

    #[tokio::test]
    async fn test_register_duplicate_removes_temp_uploads() {
        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();

        let existing = test_account();
        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        media_store.expect_store().times(0);
        repository.expect_create().times(0);

        let avatar = temp_upload("avatar.png").await;
        let cover = temp_upload("cover.png").await;
        let service = test_service(repository, media_store);

        let result = service
            .register(register_command(avatar.clone(), Some(cover.clone())))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            AccountError::UsernameAlreadyExists(_)
        ));
        assert!(!avatar.exists());
        assert!(!cover.exists());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_distinct_username() {
        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();

        let mut existing = test_account();
        existing.username = Username::new("someoneelse".to_string()).unwrap();
        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        media_store.expect_store().times(0);

        let avatar = temp_upload("avatar.png").await;
        let service = test_service(repository, media_store);

        let result = service.register(register_command(avatar.clone(), None)).await;

        assert!(matches!(
            result.unwrap_err(),
            AccountError::EmailAlreadyExists(_)
        ));
        assert!(!avatar.exists());
    }

    #[tokio::test]
    async fn test_register_avatar_upload_failure_aborts() {
        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();

        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(|_, _| Ok(None));
        media_store
            .expect_store()
            .times(1)
            .returning(|_| Err(MediaError::StoreFailed("disk full".to_string())));
        repository.expect_create().times(0);

        let avatar = temp_upload("avatar.png").await;
        let service = test_service(repository, media_store);

        let result = service.register(register_command(avatar.clone(), None)).await;

        assert!(matches!(result.unwrap_err(), AccountError::UploadFailed(_)));
        assert!(!avatar.exists());
    }

    #[tokio::test]
    async fn test_register_cover_upload_failure_degrades_to_empty() {
        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();

        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(|_, _| Ok(None));
        // First store call is the avatar, second is the cover
        let mut calls = 0;
        media_store.expect_store().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok("http://media.local/avatar.png".to_string())
            } else {
                Err(MediaError::StoreFailed("timeout".to_string()))
            }
        });
        repository
            .expect_create()
            .withf(|account| account.cover_image_url.is_empty())
            .times(1)
            .returning(|account| Ok(account));

        let avatar = temp_upload("avatar.png").await;
        let cover = temp_upload("cover.png").await;
        let service = test_service(repository, media_store);

        let result = service
            .register(register_command(avatar, Some(cover.clone())))
            .await;

        assert!(result.is_ok());
        assert!(!cover.exists());
    }

    #[tokio::test]
    async fn test_login_success_persists_new_refresh_token() {
        let mut repository = MockTestAccountRepository::new();
        let media_store = MockTestMediaStore::new();

        let account = test_account();
        let account_id = account.id;
        repository
            .expect_find_by_identifier()
            .withf(|identifier| identifier == "alice")
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_set_refresh_token()
            .withf(move |id, token| *id == account_id && token.is_some())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = test_service(repository, media_store);

        let session = service
            .login(LoginCommand {
                identifier: "alice".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .expect("Login failed");

        assert!(!session.access_token.is_empty());
        assert!(!session.refresh_token.is_empty());
        assert_ne!(session.access_token, session.refresh_token);
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_identifier_same_error() {
        // Wrong password
        let mut repository = MockTestAccountRepository::new();
        let account = test_account();
        repository
            .expect_find_by_identifier()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository.expect_set_refresh_token().times(0);
        let service = test_service(repository, MockTestMediaStore::new());

        let wrong_password = service
            .login(LoginCommand {
                identifier: "alice".to_string(),
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();

        // Unknown identifier
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_identifier()
            .times(1)
            .returning(|_| Ok(None));
        let service = test_service(repository, MockTestMediaStore::new());

        let unknown = service
            .login(LoginCommand {
                identifier: "nobody".to_string(),
                password: "whatever".to_string(),
            })
            .await
            .unwrap_err();

        // No oracle: both failures are byte-identical to the client
        assert!(matches!(wrong_password, AccountError::InvalidCredentials));
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_refresh_session_rotates_token() {
        let account = test_account();
        let account_id = account.id;
        let issuer = test_issuer();
        let old_token = issuer.issue_refresh(account_id).unwrap();

        let mut repository = MockTestAccountRepository::new();
        let old_for_match = old_token.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_rotate_refresh_token()
            .withf(move |id, current, next| {
                *id == account_id && current == old_for_match && next != old_for_match
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let service = IdentityService::new(
            Arc::new(repository),
            Arc::new(MockTestMediaStore::new()),
            issuer,
        );

        let session = service
            .refresh_session(&old_token)
            .await
            .expect("Refresh failed");
        assert_ne!(session.refresh_token, old_token);
    }

    #[tokio::test]
    async fn test_refresh_session_reused_token_rejected() {
        let account = test_account();
        let issuer = test_issuer();
        let stale_token = issuer.issue_refresh(account.id).unwrap();

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        // Compare-and-swap loses: the stored slot no longer holds this token
        repository
            .expect_rotate_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let service = IdentityService::new(
            Arc::new(repository),
            Arc::new(MockTestMediaStore::new()),
            issuer,
        );

        let result = service.refresh_session(&stale_token).await;
        assert!(matches!(result.unwrap_err(), AccountError::SessionExpired));
    }

    #[tokio::test]
    async fn test_refresh_session_garbage_token_rejected() {
        let repository = MockTestAccountRepository::new();
        let service = test_service(repository, MockTestMediaStore::new());

        let result = service.refresh_session("not.a.token").await;
        assert!(matches!(result.unwrap_err(), AccountError::SessionExpired));
    }

    #[tokio::test]
    async fn test_refresh_session_deleted_account_rejected() {
        let issuer = test_issuer();
        let token = issuer.issue_refresh(AccountId::new()).unwrap();

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = IdentityService::new(
            Arc::new(repository),
            Arc::new(MockTestMediaStore::new()),
            issuer,
        );

        let result = service.refresh_session(&token).await;
        assert!(matches!(result.unwrap_err(), AccountError::SessionExpired));
    }

    #[tokio::test]
    async fn test_logout_clears_refresh_token() {
        let account_id = AccountId::new();

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_set_refresh_token()
            .withf(move |id, token| *id == account_id && token.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = test_service(repository, MockTestMediaStore::new());
        assert!(service.logout(&account_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_password() {
        let account = test_account();
        let account_id = account.id;

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository.expect_update_password_hash().times(0);

        let service = test_service(repository, MockTestMediaStore::new());

        let result = service
            .change_password(
                &account_id,
                ChangePasswordCommand {
                    old_password: "wrong".to_string(),
                    new_password: "brand-new".to_string(),
                },
            )
            .await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_change_password_success_stores_new_hash() {
        let account = test_account();
        let account_id = account.id;

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_update_password_hash()
            .withf(move |id, hash| {
                *id == account_id
                    && hash.starts_with("$argon2")
                    && PasswordHasher::new().verify("brand-new", hash).unwrap()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = test_service(repository, MockTestMediaStore::new());

        let result = service
            .change_password(
                &account_id,
                ChangePasswordCommand {
                    old_password: "secret123".to_string(),
                    new_password: "brand-new".to_string(),
                },
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_avatar_failure_leaves_prior_value() {
        let account_id = AccountId::new();

        let mut repository = MockTestAccountRepository::new();
        let mut media_store = MockTestMediaStore::new();
        media_store
            .expect_store()
            .times(1)
            .returning(|_| Err(MediaError::StoreFailed("unreachable".to_string())));
        repository.expect_update_avatar_url().times(0);

        let upload = temp_upload("avatar.png").await;
        let service = test_service(repository, media_store);

        let result = service.update_avatar(&account_id, &upload).await;
        assert!(matches!(result.unwrap_err(), AccountError::UploadFailed(_)));
        assert!(!upload.exists());
    }
}
