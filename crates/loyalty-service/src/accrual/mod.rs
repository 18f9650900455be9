//! 外部积分计算服务对接
//!
//! `client` 封装对积分计算服务的查询与响应归约，
//! `worker` 是后台对账循环：订单提交后即刻返回，
//! 入账由这里异步完成。

mod client;
mod worker;

pub use client::{AccrualClient, AccrualLookup};
pub use worker::{ReconcilerHandle, ReconciliationWorker};
