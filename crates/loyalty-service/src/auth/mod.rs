//! 认证模块
//!
//! 注册与登录由独立的认证服务负责，本服务只验证其签发的
//! JWT 并从中取出用户身份。

mod jwt;

pub use jwt::{Claims, JwtManager};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ServiceError;

/// 当前登录用户
///
/// 从认证中间件注入的 Claims 中提取 login；中间件未放行的请求
/// 到不了这里，找不到 Claims 属于编排错误，同样按 401 处理。
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub login: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .map(|claims| AuthUser {
                login: claims.sub.clone(),
            })
            .ok_or_else(|| ServiceError::Unauthorized("请求未通过认证".to_string()))
    }
}
