//! 统一可观测性模块
//!
//! 提供日志初始化和 HTTP 请求追踪中间件。
//! 所有服务通过单一入口点配置日志，确保一致的输出格式。

pub mod middleware;
pub mod tracing;

pub use self::tracing::init;
