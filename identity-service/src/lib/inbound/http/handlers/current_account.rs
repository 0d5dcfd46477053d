use axum::http::StatusCode;
use axum::Extension;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::CurrentAccount;

/// The principal was already loaded by the authentication middleware;
/// this handler only reshapes it.
pub async fn current_account(
    Extension(current): Extension<CurrentAccount>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        AccountData::from(&current.account),
    ))
}
