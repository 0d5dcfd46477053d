use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::account::models::LoginCommand;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::cookies::with_session_cookies;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequestBody>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    // Either identifier works; at least one must be present
    let identifier = body
        .username
        .or(body.email)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username or email is required".to_string()))?;

    let session = state
        .identity_service
        .login(LoginCommand {
            identifier,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    let jar = with_session_cookies(jar, &session.access_token, &session.refresh_token);

    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, SessionResponseData::from(&session)),
    ))
}
