//! HTTP 处理器
//!
//! 只做提取参数、调用服务、映射状态码三件事，业务规则都在
//! 服务层。

pub mod balance;
pub mod orders;
pub mod withdrawals;
