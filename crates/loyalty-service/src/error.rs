//! 积分服务错误类型定义
//!
//! 包含订单登记、余额账本和提现处理的全部业务错误，
//! 并负责到 HTTP 状态码的映射。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loyalty_shared::LoyaltyError;
use serde_json::json;

/// 积分服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),

    // 订单校验与归属
    #[error("订单号校验失败")]
    InvalidOrderNumber,
    #[error("订单号已被其他用户登记")]
    OrderOwnedByOther,

    // 账本错误
    #[error("余额不足")]
    InsufficientFunds,

    // 请求参数错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 外部积分计算服务错误（仅在后台对账路径出现，不直接面向客户端）
    #[error("积分计算服务错误: {0}")]
    Accrual(String),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ServiceError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderOwnedByOther => StatusCode::CONFLICT,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Accrual(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidOrderNumber => "INVALID_ORDER_NUMBER",
            Self::OrderOwnedByOther => "ORDER_OWNED_BY_OTHER",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Accrual(_) => "ACCRUAL_SERVICE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Accrual(e) => {
                tracing::error!(error = %e, "积分计算服务不可用");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从共享基础设施错误转换
impl From<LoyaltyError> for ServiceError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::Database(e) => Self::Database(e),
            LoyaltyError::Validation(msg) => Self::Validation(msg),
            LoyaltyError::ExternalService { service, message } => {
                Self::Accrual(format!("{}: {}", service, message))
            }
            LoyaltyError::ExternalServiceTimeout { service } => {
                Self::Accrual(format!("{}: timeout", service))
            }
            LoyaltyError::RateLimited {
                service,
                retry_after_secs,
            } => Self::Accrual(format!("{}: rate limited for {}s", service, retry_after_secs)),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;
