use std::path::Path;

use async_trait::async_trait;

use crate::account::errors::AccountError;
use crate::account::errors::MediaError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedSession;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;

/// Port for identity and session operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// The avatar upload is mandatory; the cover upload is optional and a
    /// failure of that upload alone degrades to an empty cover URL. If a
    /// duplicate account is found, temp upload files are removed before
    /// the operation fails.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Duplicate account
    /// * `UploadFailed` - Avatar upload failed, registration aborted
    /// * `Crypto` - Password hashing failed, no account persisted
    /// * `DatabaseError` - Persistence failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError>;

    /// Authenticate by username or email and issue a new token pair.
    ///
    /// Persisting the new refresh token invalidates any previously issued
    /// one (single active session per account).
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier or wrong password,
    ///   indistinguishable by design
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AccountError>;

    /// Exchange a refresh token for a brand-new access/refresh pair.
    ///
    /// The incoming token must verify cryptographically and still match
    /// the account's stored slot; the swap to the new token is atomic, so
    /// two concurrent refreshes with the same old token cannot both win.
    ///
    /// # Errors
    /// * `SessionExpired` - Token invalid, expired, already rotated, or
    ///   the account no longer exists
    async fn refresh_session(&self, refresh_token: &str)
        -> Result<AuthenticatedSession, AccountError>;

    /// Clear the account's stored refresh token. Idempotent.
    async fn logout(&self, id: &AccountId) -> Result<(), AccountError>;

    /// Change the account password after verifying the old one.
    ///
    /// Also revokes the current refresh token, forcing re-login.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Old password does not match
    /// * `NotFound` - Account does not exist
    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError>;

    /// Retrieve an account by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;

    /// Update profile display fields (partial update).
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError>;

    /// Replace the account's avatar with a freshly uploaded asset.
    ///
    /// Upload failure aborts the mutation and leaves the prior URL intact.
    async fn update_avatar(&self, id: &AccountId, upload: &Path) -> Result<Account, AccountError>;

    /// Replace the account's cover image with a freshly uploaded asset.
    ///
    /// Upload failure aborts the mutation and leaves the prior URL intact.
    async fn update_cover_image(
        &self,
        id: &AccountId,
        upload: &Path,
    ) -> Result<Account, AccountError>;
}

/// Persistence operations for the account aggregate.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Unique constraint hit
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, account: Account) -> Result<Account, AccountError>;

    /// Retrieve an account by identifier.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Retrieve an account whose username or email matches the given
    /// identifier (username comparison is case-insensitive).
    async fn find_by_identifier(&self, identifier: &str)
        -> Result<Option<Account>, AccountError>;

    /// Retrieve an account colliding with either the username or the email.
    /// Used for the duplicate check during registration.
    async fn find_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError>;

    /// Overwrite the stored refresh token (`None` clears it).
    ///
    /// Succeeds silently when the account does not exist, which keeps
    /// logout idempotent.
    async fn set_refresh_token<'a>(
        &self,
        id: &AccountId,
        token: Option<&'a str>,
    ) -> Result<(), AccountError>;

    /// Atomically replace the stored refresh token, but only if it still
    /// equals `current`. Returns false when the compare failed, meaning
    /// the token was already rotated, cleared, or never stored.
    async fn rotate_refresh_token(
        &self,
        id: &AccountId,
        current: &str,
        next: &str,
    ) -> Result<bool, AccountError>;

    /// Store a new password hash and clear the refresh token slot in the
    /// same statement.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn update_password_hash(
        &self,
        id: &AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError>;

    /// Apply a partial profile update and return the updated account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    async fn update_profile<'a>(
        &self,
        id: &AccountId,
        full_name: Option<&'a str>,
        email: Option<&'a EmailAddress>,
    ) -> Result<Account, AccountError>;

    /// Replace the stored avatar URL and return the updated account.
    async fn update_avatar_url(&self, id: &AccountId, url: &str)
        -> Result<Account, AccountError>;

    /// Replace the stored cover image URL and return the updated account.
    async fn update_cover_url(&self, id: &AccountId, url: &str)
        -> Result<Account, AccountError>;
}

/// Binary asset storage for avatar and cover images.
///
/// The one potentially slow, blocking collaborator in the system. Takes a
/// local temp file and returns the public URL of the stored copy; it never
/// deletes the source file, that stays the caller's responsibility.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    async fn store(&self, local_path: &Path) -> Result<String, MediaError>;
}
