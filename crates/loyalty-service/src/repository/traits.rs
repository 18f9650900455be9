//! 仓储 Trait 定义
//!
//! 定义订单登记与余额账本的接口，便于服务层依赖抽象而非具体实现，
//! 支持 mock 测试。

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Balance, Order, Withdrawal};

/// 订单提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 新订单已登记
    Accepted,
    /// 同一用户重复提交，幂等返回
    AlreadyOwned,
    /// 订单号已归属其他用户
    OwnedByOther,
}

/// 提现结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// 提现完成，余额与流水已原子落库
    Completed,
    /// 余额不足，未产生任何状态变更
    InsufficientFunds,
}

/// 订单登记接口
///
/// 负责订单号到归属人的映射，保证全局唯一与同用户幂等。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRegistry: Send + Sync {
    /// 登记订单
    ///
    /// 订单号格式校验由调用方完成；存储层唯一约束兜底并发下的
    /// 查重-插入竞争。
    async fn submit(&self, login: &str, number: &str) -> Result<SubmitOutcome>;

    /// 按订单号查询
    async fn get(&self, number: &str) -> Result<Option<Order>>;

    /// 某用户的全部订单，按上传时间升序
    async fn list_by_login(&self, login: &str) -> Result<Vec<Order>>;

    /// 认领一批待对账订单（NEW/PROCESSING），并标记为 PROCESSING
    ///
    /// 使用 FOR UPDATE SKIP LOCKED，多实例部署时不会重复认领同一批。
    async fn claim_pending(&self, batch_size: i64) -> Result<Vec<Order>>;

    /// NEW -> PROCESSING 状态推进；返回是否真的发生了变更
    async fn mark_processing(&self, number: &str) -> Result<bool>;

    /// 标记订单为 INVALID 终态
    ///
    /// 已到终态的订单不受影响；返回是否真的发生了变更。
    async fn mark_invalid(&self, number: &str) -> Result<bool>;
}

/// 余额账本接口
///
/// 余额与累计提现只能经由这里的原子操作变更。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// 查询用户当前余额与累计提现
    async fn get_balance(&self, login: &str) -> Result<Balance>;

    /// 为已结算订单入账
    ///
    /// 订单终态写入与余额增加在同一事务内完成；按订单幂等，
    /// 重复调用不会二次入账。返回本次是否真的入账。
    async fn credit_for_processed_order(
        &self,
        login: &str,
        number: &str,
        amount: Decimal,
    ) -> Result<bool>;

    /// 提现
    ///
    /// 扣减余额、累加提现总额、写入提现流水三者同事务提交；
    /// 余额不足时整体回滚，不产生任何状态变更。
    async fn withdraw(
        &self,
        login: &str,
        order_number: &str,
        sum: Decimal,
    ) -> Result<WithdrawOutcome>;

    /// 某用户的全部提现流水，按处理时间升序
    async fn list_withdrawals(&self, login: &str) -> Result<Vec<Withdrawal>>;
}
