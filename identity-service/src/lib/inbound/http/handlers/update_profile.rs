use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::EmailAddress;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

/// HTTP request body for partial profile updates (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, AccountError> {
        let email = self.email.map(EmailAddress::new).transpose()?;
        let full_name = self
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(UpdateProfileCommand { full_name, email })
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let command = body.try_into_command().map_err(ApiError::from)?;

    state
        .identity_service
        .update_profile(&current.account.id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}
