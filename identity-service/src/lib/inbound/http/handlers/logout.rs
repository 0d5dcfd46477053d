use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;

use super::ApiError;
use super::ApiSuccess;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::cookies::without_session_cookies;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<()>), ApiError> {
    state
        .identity_service
        .logout(&current.account.id)
        .await
        .map_err(ApiError::from)?;

    Ok((
        without_session_cookies(jar),
        ApiSuccess::new(StatusCode::OK, ()),
    ))
}
