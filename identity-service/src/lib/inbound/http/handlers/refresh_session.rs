use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::cookies::with_session_cookies;
use crate::inbound::http::cookies::REFRESH_COOKIE;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequestBody {
    #[serde(default)]
    refresh_token: Option<String>,
}

pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequestBody>>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    // Cookie takes precedence over the body field
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Refresh token is required".to_string()))?;

    let session = state
        .identity_service
        .refresh_session(&incoming)
        .await
        .map_err(ApiError::from)?;

    let jar = with_session_cookies(jar, &session.access_token, &session.refresh_token);

    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, SessionResponseData::from(&session)),
    ))
}
