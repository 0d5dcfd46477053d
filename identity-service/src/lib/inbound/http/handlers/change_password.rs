use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::ChangePasswordCommand;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequestBody {
    old_password: String,
    new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(body): Json<ChangePasswordRequestBody>,
) -> Result<ApiSuccess<()>, ApiError> {
    if body.new_password.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "New password must not be empty".to_string(),
        ));
    }

    state
        .identity_service
        .change_password(
            &current.account.id,
            ChangePasswordCommand {
                old_password: body.old_password,
                new_password: body.new_password,
            },
        )
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, ()))
}
