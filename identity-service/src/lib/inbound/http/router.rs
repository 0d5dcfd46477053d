use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::current_account::current_account;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::refresh_session::refresh_session;
use super::handlers::register::register;
use super::handlers::update_avatar::update_avatar;
use super::handlers::update_cover_image::update_cover_image;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::domain::account::service::IdentityService;
use crate::outbound::media::LocalMediaStore;
use crate::outbound::repositories::PostgresAccountRepository;

#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<IdentityService<PostgresAccountRepository, LocalMediaStore>>,
    pub token_issuer: Arc<TokenIssuer>,
    pub upload_dir: PathBuf,
}

pub fn create_router(
    identity_service: Arc<IdentityService<PostgresAccountRepository, LocalMediaStore>>,
    token_issuer: Arc<TokenIssuer>,
    upload_dir: PathBuf,
) -> Router {
    let state = AppState {
        identity_service,
        token_issuer,
        upload_dir,
    };

    let public_routes = Router::new()
        .route("/api/accounts/register", post(register))
        .route("/api/accounts/login", post(login))
        .route("/api/accounts/refresh", post(refresh_session));

    let protected_routes = Router::new()
        .route("/api/accounts/logout", post(logout))
        .route("/api/accounts/change-password", post(change_password))
        .route("/api/accounts/me", get(current_account))
        .route("/api/accounts/me", patch(update_profile))
        .route("/api/accounts/me/avatar", patch(update_avatar))
        .route("/api/accounts/me/cover", patch(update_cover_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
