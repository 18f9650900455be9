//! 余额账本仓储
//!
//! 余额、累计提现与提现流水的唯一写入口。所有变更都在单个
//! 事务内完成：入账同时落订单终态，提现同时落流水，
//! 任何一半单独提交都是账本一致性破坏。

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::traits::{BalanceLedger, WithdrawOutcome};
use crate::error::Result;
use crate::models::{Balance, Withdrawal};

/// 余额账本仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceLedger for LedgerRepository {
    async fn get_balance(&self, login: &str) -> Result<Balance> {
        let balance = sqlx::query_as::<_, Balance>(
            "SELECT balance, withdrawn FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        // 用户行在首次写操作时才补建，查询阶段没有行等价于零余额
        Ok(balance.unwrap_or_else(Balance::zero))
    }

    async fn credit_for_processed_order(
        &self,
        login: &str,
        number: &str,
        amount: Decimal,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // 状态守卫保证按订单恰好入账一次：只有仍处于非终态的订单
        // 才会被推进到 PROCESSED，重复调用时这里是 0 行受影响，
        // 余额分支不会执行
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'PROCESSED', accrual = $1, uploaded_at = NOW()
            WHERE number = $2 AND login = $3
              AND status NOT IN ('PROCESSED', 'INVALID')
            "#,
        )
        .bind(amount)
        .bind(number)
        .bind(login)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 1 {
            sqlx::query("UPDATE users SET balance = balance + $1 WHERE login = $2")
                .bind(amount)
                .bind(login)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(updated == 1)
    }

    async fn withdraw(
        &self,
        login: &str,
        order_number: &str,
        sum: Decimal,
    ) -> Result<WithdrawOutcome> {
        let mut tx = self.pool.begin().await?;

        // 补建用户行后行级锁串行化同一用户的并发余额变更；
        // 不同用户各锁各行，互不阻塞
        sqlx::query("INSERT INTO users (login) VALUES ($1) ON CONFLICT (login) DO NOTHING")
            .bind(login)
            .execute(&mut *tx)
            .await?;

        let balance: Decimal =
            sqlx::query_scalar("SELECT balance FROM users WHERE login = $1 FOR UPDATE")
                .bind(login)
                .fetch_one(&mut *tx)
                .await?;

        if balance < sum {
            // 事务随 drop 回滚，不留任何变更
            return Ok(WithdrawOutcome::InsufficientFunds);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET balance = balance - $1, withdrawn = withdrawn + $1
            WHERE login = $2
            "#,
        )
        .bind(sum)
        .bind(login)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO withdrawals (login, order_number, sum, processed_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(login)
        .bind(order_number)
        .bind(sum)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(WithdrawOutcome::Completed)
    }

    async fn list_withdrawals(&self, login: &str) -> Result<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, login, order_number, sum, processed_at
            FROM withdrawals
            WHERE login = $1
            ORDER BY processed_at ASC
            "#,
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }
}
