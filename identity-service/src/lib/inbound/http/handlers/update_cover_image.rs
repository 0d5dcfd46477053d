use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;
use crate::inbound::http::uploads::save_upload_field;

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("cover_image") {
            upload = Some(save_upload_field(field, &state.upload_dir).await?);
        }
    }

    let upload = upload
        .ok_or_else(|| ApiError::BadRequest("Cover image file is required".to_string()))?;

    state
        .identity_service
        .update_cover_image(&current.account.id, &upload)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}
