//! 业务服务层
//!
//! 组合订单校验、仓储与后台对账：`OrderService` 负责订单提交
//! 与查询，`WithdrawalService` 负责余额查询与提现。

pub mod dto;
mod order_service;
mod withdrawal_service;

pub use order_service::{OrderService, SubmitStatus};
pub use withdrawal_service::WithdrawalService;
