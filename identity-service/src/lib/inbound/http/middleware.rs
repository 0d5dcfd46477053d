use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::cookies::ACCESS_COOKIE;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the authenticated principal.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub account: Account,
}

/// Middleware gating protected routes behind a valid access token.
///
/// Credential priority: `accessToken` cookie, then `Authorization: Bearer`.
/// Stateless with respect to refresh tokens; an expired access token is a
/// plain 401 and recovery is the client's job via the refresh endpoint.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_access_token(&req)?;

    let claims = state.token_issuer.verify_access(&token).map_err(|e| {
        tracing::warn!(error = %e, "Access token verification failed");
        unauthorized("Invalid or expired token")
    })?;

    let account_id = AccountId::from_string(&claims.sub)
        .map_err(|_| unauthorized("Invalid token format"))?;

    // The account may have been deleted after the token was issued
    let account = state
        .identity_service
        .get_account(&account_id)
        .await
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(CurrentAccount { account });

    Ok(next.run(req).await)
}

fn extract_access_token(req: &Request) -> Result<String, Response> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing credentials"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization header format. Expected: Bearer <token>"))?;

    Ok(token.to_string())
}

fn unauthorized(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}
