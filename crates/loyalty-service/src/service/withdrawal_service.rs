//! 提现服务
//!
//! 校验提现请求并把扣减原子地落到账本：余额扣减、累计提现
//! 增加、流水记录三者同事务提交，余额不足时整体回滚。

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{Result, ServiceError};
use crate::luhn;
use crate::models::{Balance, WithdrawalDto};
use crate::repository::{BalanceLedger, WithdrawOutcome};
use crate::service::dto::WithdrawRequest;

/// 提现服务
pub struct WithdrawalService<L>
where
    L: BalanceLedger,
{
    ledger: Arc<L>,
}

impl<L> WithdrawalService<L>
where
    L: BalanceLedger,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// 查询当前余额与累计提现
    #[instrument(skip(self))]
    pub async fn get_balance(&self, login: &str) -> Result<Balance> {
        self.ledger.get_balance(login).await
    }

    /// 发起提现
    #[instrument(skip(self, request), fields(order = %request.order, sum = %request.sum))]
    pub async fn withdraw(&self, login: &str, request: WithdrawRequest) -> Result<()> {
        request.validate()?;

        if request.sum <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "提现金额必须大于零".to_string(),
            ));
        }

        // 单号格式不合法直接拒绝，不触碰存储
        if !luhn::is_valid(&request.order) {
            return Err(ServiceError::InvalidOrderNumber);
        }

        match self
            .ledger
            .withdraw(login, &request.order, request.sum)
            .await?
        {
            WithdrawOutcome::Completed => {
                info!(login, order = %request.order, sum = %request.sum, "提现完成");
                Ok(())
            }
            WithdrawOutcome::InsufficientFunds => Err(ServiceError::InsufficientFunds),
        }
    }

    /// 查询提现流水，按处理时间升序
    #[instrument(skip(self))]
    pub async fn list_withdrawals(&self, login: &str) -> Result<Vec<WithdrawalDto>> {
        let withdrawals = self.ledger.list_withdrawals(login).await?;
        Ok(withdrawals.into_iter().map(WithdrawalDto::from).collect())
    }
}
