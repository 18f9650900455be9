//! 积分计算服务的本地模拟
//!
//! 用于本地联调与端到端测试，行为确定可预期：
//! - 同一订单号前两次查询依次返回 REGISTERED、PROCESSING，
//!   第三次起返回 PROCESSED，返点金额由订单号推导（订单号
//!   数字和 * 7.25），方便测试侧断言；
//! - 以 `000` 结尾的订单号返回 INVALID，用来演练无效订单路径；
//! - 以 `99` 结尾的订单号恒返回 204，模拟远端不认识的订单；
//! - `MOCK_RATE_LIMIT_EVERY` 设为 N 时每第 N 个请求返回 429
//!   并携带 Retry-After，用来演练限流路径。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

/// 每个订单号被查询的次数
#[derive(Clone, Default)]
struct MockState {
    hits: Arc<Mutex<HashMap<String, u32>>>,
    total_requests: Arc<AtomicU64>,
    rate_limit_every: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MOCK_ACCRUAL_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);

    let rate_limit_every = std::env::var("MOCK_RATE_LIMIT_EVERY")
        .ok()
        .and_then(|v| v.parse().ok());

    let state = MockState {
        rate_limit_every,
        ..MockState::default()
    };

    let app = Router::new()
        .route("/api/orders/{number}", get(get_order))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("mock-accrual listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// `GET /api/orders/{number}`
async fn get_order(State(state): State<MockState>, Path(number): Path<String>) -> Response {
    let total = state.total_requests.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(every) = state.rate_limit_every {
        if every > 0 && total % every == 0 {
            let mut headers = HeaderMap::new();
            headers.insert("Retry-After", "2".parse().unwrap());
            return (StatusCode::TOO_MANY_REQUESTS, headers).into_response();
        }
    }

    if number.ends_with("99") {
        return StatusCode::NO_CONTENT.into_response();
    }

    if number.ends_with("000") {
        return Json(serde_json::json!({
            "order": number,
            "status": "INVALID"
        }))
        .into_response();
    }

    let hit = {
        let mut hits = state.hits.lock().expect("mock state poisoned");
        let entry = hits.entry(number.clone()).or_insert(0);
        *entry += 1;
        *entry
    };

    let body = match hit {
        1 => serde_json::json!({ "order": number, "status": "REGISTERED" }),
        2 => serde_json::json!({ "order": number, "status": "PROCESSING" }),
        _ => serde_json::json!({
            "order": number,
            "status": "PROCESSED",
            "accrual": accrual_for(&number)
        }),
    };

    Json(body).into_response()
}

/// 由订单号推导确定的返点金额
fn accrual_for(number: &str) -> f64 {
    let digit_sum: u32 = number
        .bytes()
        .filter(|b| b.is_ascii_digit())
        .map(|b| u32::from(b - b'0'))
        .sum();
    f64::from(digit_sum) * 7.25
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(state: MockState) -> Router {
        Router::new()
            .route("/api/orders/{number}", get(get_order))
            .with_state(state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_order_progresses_to_processed() {
        let app = app(MockState::default());

        let mut last = serde_json::Value::Null;
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/orders/12345678903")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            last = body_json(response).await;
        }

        assert_eq!(last["status"], "PROCESSED");
        // 1+2+3+4+5+6+7+8+9+0+3 = 48, 48 * 7.25 = 348.0
        assert_eq!(last["accrual"], serde_json::json!(348.0));
    }

    #[tokio::test]
    async fn test_unknown_order_returns_no_content() {
        let app = app(MockState::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders/1299")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_invalid_suffix_returns_invalid_status() {
        let app = app(MockState::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders/12345000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "INVALID");
        assert!(body.get("accrual").is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let state = MockState {
            rate_limit_every: Some(1),
            ..MockState::default()
        };
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders/12345678903")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "2");
    }
}
