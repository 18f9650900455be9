//! 积分服务入口
//!
//! 加载配置、连接数据库并执行迁移、启动后台对账循环与 HTTP 服务。

use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use loyalty_service::accrual::{AccrualClient, ReconciliationWorker};
use loyalty_service::auth::JwtManager;
use loyalty_service::middleware::auth_middleware;
use loyalty_service::repository::{LedgerRepository, OrderRepository};
use loyalty_service::routes;
use loyalty_service::service::{OrderService, WithdrawalService};
use loyalty_service::state::AppState;
use loyalty_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/default.toml + 环境特定配置 + LOYALTY_ 环境变量
    let config = AppConfig::load("loyalty-service").unwrap_or_default();

    observability::init(&config.observability)?;

    if config.is_production()
        && config.auth.jwt_secret == loyalty_shared::config::AuthConfig::default().jwt_secret
    {
        // 与认证服务共享的密钥必须在生产环境显式下发
        anyhow::bail!("生产环境必须通过 LOYALTY_AUTH_JWT_SECRET 配置签名密钥");
    }

    info!("Starting loyalty-service on {}", config.server_addr());

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;
    sqlx::migrate!("../../migrations").run(db.pool()).await?;
    info!("Database migrations applied");

    let jwt_manager = JwtManager::new(&config.auth);

    let order_repo = Arc::new(OrderRepository::new(db.pool().clone()));
    let ledger_repo = Arc::new(LedgerRepository::new(db.pool().clone()));

    // 后台对账循环：提交路径即时入队 + 周期扫描兜底
    let accrual_client = AccrualClient::new(&config.accrual)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (worker, reconciler) = ReconciliationWorker::new(
        order_repo.clone(),
        ledger_repo.clone(),
        accrual_client,
        config.accrual.clone(),
        shutdown_rx,
    );
    let worker_task = tokio::spawn(worker.run());

    let order_service = Arc::new(OrderService::new(order_repo, reconciler));
    let withdrawal_service = Arc::new(WithdrawalService::new(ledger_repo));

    let state = AppState::new(
        db.pool().clone(),
        jwt_manager,
        order_service,
        withdrawal_service,
    );

    let app = Router::new()
        .nest("/api/user", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                move || readiness_check(db_for_ready.clone())
            }),
        )
        // 认证中间件：验证 JWT Token
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // 可观测性中间件：请求追踪与请求 ID 关联
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        // 提交路径不等外部服务，所有端点都应在秒级内返回
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接，
    // 等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 通知后台对账循环退出；循环在两次查询之间响应信号，
    // 不会把订单留在写了一半的状态
    if shutdown_tx.send(true).is_err() {
        warn!("对账循环已提前退出");
    }
    let _ = worker_task.await;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "loyalty-service"
    }))
}

/// 就绪探针：检查数据库连接是否可用
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "loyalty-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
