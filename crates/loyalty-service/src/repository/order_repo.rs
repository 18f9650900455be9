//! 订单仓储
//!
//! 提供订单登记与状态推进的数据访问。订单号全局唯一由
//! `orders.number` 主键约束兜底，应用层的查重只是快速通道。

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::{OrderRegistry, SubmitOutcome};
use crate::error::Result;
use crate::models::Order;

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 确保用户行存在
    ///
    /// 注册属于外部认证系统，本服务首次见到某个 login 时补建
    /// 账本行，余额从零开始。
    async fn ensure_user(&self, login: &str) -> Result<()> {
        sqlx::query("INSERT INTO users (login) VALUES ($1) ON CONFLICT (login) DO NOTHING")
            .bind(login)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRegistry for OrderRepository {
    async fn submit(&self, login: &str, number: &str) -> Result<SubmitOutcome> {
        self.ensure_user(login).await?;

        // ON CONFLICT DO NOTHING 把唯一约束冲突变成 0 行受影响，
        // 并发提交同一订单号时不会出现插入报错路径
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (number, login, status, uploaded_at)
            VALUES ($1, $2, 'NEW', NOW())
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(number)
        .bind(login)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            return Ok(SubmitOutcome::Accepted);
        }

        // 插入未发生说明订单号已存在，读出归属人判定冲突方向。
        // 订单从不删除，这里读不到行只可能是异常状态。
        let owner: Option<String> =
            sqlx::query_scalar("SELECT login FROM orders WHERE number = $1")
                .bind(number)
                .fetch_optional(&self.pool)
                .await?;

        match owner {
            Some(o) if o == login => Ok(SubmitOutcome::AlreadyOwned),
            Some(_) => Ok(SubmitOutcome::OwnedByOther),
            None => Err(crate::error::ServiceError::Internal(format!(
                "订单 {} 插入冲突后查询不到归属",
                number
            ))),
        }
    }

    async fn get(&self, number: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, login, status, accrual, uploaded_at
            FROM orders
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_by_login(&self, login: &str) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, login, status, accrual, uploaded_at
            FROM orders
            WHERE login = $1
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn claim_pending(&self, batch_size: i64) -> Result<Vec<Order>> {
        // 认领即标记 PROCESSING，锁只在本条语句内持有，
        // 不会横跨后续的外部服务查询
        let orders = sqlx::query_as::<_, Order>(
            r#"
            WITH pending AS (
                SELECT number
                FROM orders
                WHERE status IN ('NEW', 'PROCESSING')
                ORDER BY uploaded_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT $1
            )
            UPDATE orders o
            SET status = 'PROCESSING'
            FROM pending p
            WHERE o.number = p.number
            RETURNING o.number, o.login, o.status, o.accrual, o.uploaded_at
            "#,
        )
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn mark_processing(&self, number: &str) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE orders SET status = 'PROCESSING' WHERE number = $1 AND status = 'NEW'",
        )
        .bind(number)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn mark_invalid(&self, number: &str) -> Result<bool> {
        // 终态保护：INVALID/PROCESSED 的订单不再变更
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'INVALID', uploaded_at = NOW()
            WHERE number = $1 AND status NOT IN ('INVALID', 'PROCESSED')
            "#,
        )
        .bind(number)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}
