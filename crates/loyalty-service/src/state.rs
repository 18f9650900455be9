//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtManager;
use crate::repository::{LedgerRepository, OrderRepository};
use crate::service::{OrderService, WithdrawalService};

/// Axum 应用共享状态
///
/// 服务实例在启动时构造一次，通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    /// JWT 验证器
    pub jwt_manager: JwtManager,
    /// 订单服务
    pub order_service: Arc<OrderService<OrderRepository>>,
    /// 提现服务
    pub withdrawal_service: Arc<WithdrawalService<LedgerRepository>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        jwt_manager: JwtManager,
        order_service: Arc<OrderService<OrderRepository>>,
        withdrawal_service: Arc<WithdrawalService<LedgerRepository>>,
    ) -> Self {
        Self {
            pool,
            jwt_manager,
            order_service,
            withdrawal_service,
        }
    }
}
