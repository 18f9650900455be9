//! 订单服务
//!
//! 订单提交的编排入口：格式校验 -> 幂等登记 -> 通知后台对账。
//! 提交路径不等待外部积分服务，响应延迟与远端可用性解耦；
//! 已到终态的订单重复提交直接返回缓存状态，不会重新触发查询。

use std::sync::Arc;

use tracing::{info, instrument};

use crate::accrual::ReconcilerHandle;
use crate::error::{Result, ServiceError};
use crate::luhn;
use crate::models::OrderDto;
use crate::repository::{OrderRegistry, SubmitOutcome};

/// 订单提交的对外结果
///
/// 错误路径（格式非法、归属冲突）走 `ServiceError`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// 新订单已受理，等待后台对账（HTTP 202）
    Accepted,
    /// 本人重复提交，幂等返回（HTTP 200）
    AlreadyUploaded,
}

/// 订单服务
pub struct OrderService<R>
where
    R: OrderRegistry,
{
    orders: Arc<R>,
    reconciler: ReconcilerHandle,
}

impl<R> OrderService<R>
where
    R: OrderRegistry,
{
    pub fn new(orders: Arc<R>, reconciler: ReconcilerHandle) -> Self {
        Self { orders, reconciler }
    }

    /// 提交订单号
    #[instrument(skip(self))]
    pub async fn submit(&self, login: &str, number: &str) -> Result<SubmitStatus> {
        // 格式不合法直接拒绝，不触碰存储
        if !luhn::is_valid(number) {
            return Err(ServiceError::InvalidOrderNumber);
        }

        match self.orders.submit(login, number).await? {
            SubmitOutcome::Accepted => {
                info!(order = number, login, "订单已登记，通知后台对账");
                self.reconciler.enqueue(number);
                Ok(SubmitStatus::Accepted)
            }
            SubmitOutcome::AlreadyOwned => Ok(SubmitStatus::AlreadyUploaded),
            SubmitOutcome::OwnedByOther => Err(ServiceError::OrderOwnedByOther),
        }
    }

    /// 查询当前用户的订单列表，按上传时间升序
    #[instrument(skip(self))]
    pub async fn list_orders(&self, login: &str) -> Result<Vec<OrderDto>> {
        let orders = self.orders.list_by_login(login).await?;
        Ok(orders.into_iter().map(OrderDto::from).collect())
    }
}
