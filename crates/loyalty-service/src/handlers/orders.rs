//! 订单处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthUser;
use crate::error::{Result, ServiceError};
use crate::service::SubmitStatus;
use crate::state::AppState;

/// `POST /api/user/orders`
///
/// 请求体是裸的订单号（纯文本或 JSON 标量）。
/// 202 = 新订单已受理；200 = 本人重复提交。
pub async fn submit_order(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> Result<StatusCode> {
    // 兼容 "12345678903"（JSON 字符串标量）与裸文本两种形态
    let number = body.trim().trim_matches('"');
    if number.is_empty() {
        return Err(ServiceError::InvalidOrderNumber);
    }

    match state.order_service.submit(&user.login, number).await? {
        SubmitStatus::Accepted => Ok(StatusCode::ACCEPTED),
        SubmitStatus::AlreadyUploaded => Ok(StatusCode::OK),
    }
}

/// `GET /api/user/orders`
///
/// 按上传时间升序返回当前用户的订单；没有订单时返回 204。
pub async fn list_orders(State(state): State<AppState>, user: AuthUser) -> Result<Response> {
    let orders = state.order_service.list_orders(&user.login).await?;

    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(orders).into_response())
}
