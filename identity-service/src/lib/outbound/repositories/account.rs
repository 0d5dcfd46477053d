use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

const ACCOUNT_COLUMNS: &str = "id, username, email, full_name, password_hash, \
     avatar_url, cover_image_url, refresh_token, created_at";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    password_hash: String,
    avatar_url: String,
    cover_image_url: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, AccountError> {
        Ok(Account {
            id: AccountId(self.id),
            username: Username::new(self.username)?,
            email: EmailAddress::new(self.email)?,
            full_name: self.full_name,
            password_hash: self.password_hash,
            avatar_url: self.avatar_url,
            cover_image_url: self.cover_image_url,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
        })
    }
}

fn map_unique_violation(e: sqlx::Error, username: &Username, email: &EmailAddress) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("accounts_username_key") {
                return AccountError::UsernameAlreadyExists(username.as_str().to_string());
            }
            if db_err.constraint() == Some("accounts_email_key") {
                return AccountError::EmailAlreadyExists(email.as_str().to_string());
            }
        }
    }
    AccountError::DatabaseError(e.to_string())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, username, email, full_name, password_hash,
                 avatar_url, cover_image_url, refresh_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.full_name)
        .bind(&account.password_hash)
        .bind(&account.avatar_url)
        .bind(&account.cover_image_url)
        .bind(&account.refresh_token)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &account.username, &account.email))?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountError> {
        // Usernames are stored lowercased; emails compare as submitted
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE username = lower($1) OR email = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE username = $1 OR email = $2"
        ))
        .bind(username.as_str())
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn set_refresh_token<'a>(
        &self,
        id: &AccountId,
        token: Option<&'a str>,
    ) -> Result<(), AccountError> {
        // Zero rows affected is fine: logout stays idempotent
        sqlx::query("UPDATE accounts SET refresh_token = $2 WHERE id = $1")
            .bind(id.0)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &AccountId,
        current: &str,
        next: &str,
    ) -> Result<bool, AccountError> {
        // Single conditional UPDATE: the read-compare-write is atomic per
        // account, so concurrent refreshes with the same old token cannot
        // both succeed
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = $3 \
             WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id.0)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(
        &self,
        id: &AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        // The hash write and the session revocation land in one statement
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, refresh_token = NULL WHERE id = $1",
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_profile<'a>(
        &self,
        id: &AccountId,
        full_name: Option<&'a str>,
        email: Option<&'a EmailAddress>,
    ) -> Result<Account, AccountError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "UPDATE accounts \
             SET full_name = COALESCE($2, full_name), \
                 email = COALESCE($3, email) \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(full_name)
        .bind(email.map(|e| e.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("accounts_email_key")
                {
                    let email = email.map(|e| e.as_str()).unwrap_or_default();
                    return AccountError::EmailAlreadyExists(email.to_string());
                }
            }
            AccountError::DatabaseError(e.to_string())
        })?;

        row.map(AccountRow::into_account)
            .transpose()?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn update_avatar_url(
        &self,
        id: &AccountId,
        url: &str,
    ) -> Result<Account, AccountError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "UPDATE accounts SET avatar_url = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(AccountRow::into_account)
            .transpose()?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn update_cover_url(&self, id: &AccountId, url: &str) -> Result<Account, AccountError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "UPDATE accounts SET cover_image_url = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(AccountRow::into_account)
            .transpose()?
            .ok_or(AccountError::NotFound(id.to_string()))
    }
}
