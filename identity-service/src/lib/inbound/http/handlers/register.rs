use std::path::Path;
use std::path::PathBuf;

use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use thiserror::Error;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::account::errors::UsernameError;
use crate::account::models::EmailAddress;
use crate::account::models::RegisterCommand;
use crate::account::models::Username;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;
use crate::inbound::http::uploads::discard_uploads;
use crate::inbound::http::uploads::save_upload_field;

pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let form = collect_form(&mut multipart, &state.upload_dir).await?;
    let command = form.into_command().await?;

    state
        .identity_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::CREATED, account.into()))
}

/// Raw multipart fields of a registration request. File parts are already
/// written to temp storage by the time the form is complete.
#[derive(Debug, Default)]
struct RegisterForm {
    username: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    password: Option<String>,
    avatar: Option<PathBuf>,
    cover_image: Option<PathBuf>,
}

async fn collect_form(
    multipart: &mut Multipart,
    upload_dir: &Path,
) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                form.discard().await;
                return Err(ApiError::BadRequest(format!("Malformed multipart body: {}", e)));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let result = match name.as_str() {
            "username" => read_text(field).await.map(|v| form.username = Some(v)),
            "email" => read_text(field).await.map(|v| form.email = Some(v)),
            "full_name" => read_text(field).await.map(|v| form.full_name = Some(v)),
            "password" => read_text(field).await.map(|v| form.password = Some(v)),
            "avatar" => save_upload_field(field, upload_dir)
                .await
                .map(|p| form.avatar = Some(p)),
            "cover_image" => save_upload_field(field, upload_dir)
                .await
                .map(|p| form.cover_image = Some(p)),
            // Unknown parts are ignored
            _ => Ok(()),
        };

        if let Err(e) = result {
            form.discard().await;
            return Err(e);
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterError {
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Field must not be empty: {0}")]
    MissingField(&'static str),

    #[error("Avatar file is required")]
    MissingAvatar,
}

impl From<ParseRegisterError> for ApiError {
    fn from(err: ParseRegisterError) -> Self {
        match err {
            ParseRegisterError::MissingField(_) | ParseRegisterError::MissingAvatar => {
                ApiError::BadRequest(err.to_string())
            }
            ParseRegisterError::Username(_) | ParseRegisterError::Email(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
        }
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ParseRegisterError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ParseRegisterError::MissingField(name)),
    }
}

impl RegisterForm {
    /// Validate text fields and produce a domain command. Temp files are
    /// removed before returning any validation failure, so nothing leaks
    /// on the error path.
    async fn into_command(mut self) -> Result<RegisterCommand, ApiError> {
        match self.validate() {
            Ok((username, email, full_name, password)) => {
                let avatar = match self.avatar.take() {
                    Some(path) => path,
                    None => {
                        self.discard().await;
                        return Err(ParseRegisterError::MissingAvatar.into());
                    }
                };
                Ok(RegisterCommand {
                    username,
                    email,
                    full_name,
                    password,
                    avatar,
                    cover_image: self.cover_image.take(),
                })
            }
            Err(e) => {
                self.discard().await;
                Err(e.into())
            }
        }
    }

    fn validate(
        &self,
    ) -> Result<(Username, EmailAddress, String, String), ParseRegisterError> {
        let username = Username::new(required(self.username.clone(), "username")?)?;
        let email = EmailAddress::new(required(self.email.clone(), "email")?)?;
        let full_name = required(self.full_name.clone(), "full_name")?;
        let password = required(self.password.clone(), "password")?;
        Ok((username, email, full_name, password))
    }

    async fn discard(&mut self) {
        let files = self.avatar.take().into_iter().chain(self.cover_image.take());
        discard_uploads(files).await;
    }
}
