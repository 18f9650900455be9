//! 余额与提现处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::Balance;
use crate::service::dto::WithdrawRequest;
use crate::state::AppState;

/// `GET /api/user/balance`
pub async fn get_balance(State(state): State<AppState>, user: AuthUser) -> Result<Json<Balance>> {
    let balance = state.withdrawal_service.get_balance(&user.login).await?;
    Ok(Json(balance))
}

/// `POST /api/user/balance/withdraw`
///
/// 200 = 提现完成；402 = 余额不足；422 = 单号校验失败。
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<WithdrawRequest>,
) -> Result<StatusCode> {
    state
        .withdrawal_service
        .withdraw(&user.login, request)
        .await?;
    Ok(StatusCode::OK)
}
