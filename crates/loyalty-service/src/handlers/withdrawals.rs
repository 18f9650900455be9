//! 提现流水处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/user/withdrawals`
///
/// 按处理时间升序返回提现流水；没有记录时返回 204。
pub async fn list_withdrawals(State(state): State<AppState>, user: AuthUser) -> Result<Response> {
    let withdrawals = state
        .withdrawal_service
        .list_withdrawals(&user.login)
        .await?;

    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(withdrawals).into_response())
}
