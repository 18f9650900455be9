//! 数据模型定义

mod order;
mod withdrawal;

pub use order::{Order, OrderDto, OrderStatus};
pub use withdrawal::{Withdrawal, WithdrawalDto};

use rust_decimal::Decimal;
use serde::Serialize;

/// 用户余额视图
///
/// `current` 是当前可用余额，`withdrawn` 是累计提现总额，
/// 两者都只能通过账本的原子操作变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Balance {
    #[serde(with = "rust_decimal::serde::float")]
    #[sqlx(rename = "balance")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl Balance {
    /// 空账户余额
    pub fn zero() -> Self {
        Self {
            current: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
        }
    }
}
