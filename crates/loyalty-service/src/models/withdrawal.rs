//! 提现模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// 提现流水记录
///
/// 每次成功提现恰好产生一条，创建后不可变更。
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub login: String,
    pub order_number: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

/// 提现列表响应项
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalDto {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(w: Withdrawal) -> Self {
        Self {
            order: w.order_number,
            sum: w.sum,
            processed_at: w.processed_at,
        }
    }
}
