//! 日志初始化模块
//!
//! 基于 tracing-subscriber 构建日志管线，支持 JSON（结构化）和
//! pretty（人类可读）两种输出格式，日志级别可被 RUST_LOG 覆盖。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 初始化全局日志订阅器
///
/// 进程内只能调用一次；重复初始化返回错误而不是 panic，
/// 便于测试场景下多次调用时忽略。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    // 构建环境过滤器：RUST_LOG 优先于配置文件
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // 构建日志层
    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
