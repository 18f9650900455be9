//! 积分计算服务客户端
//!
//! 通过 `GET {base}/api/orders/{number}` 查询单个订单的计算结果，
//! 并把远端的四种状态归约为本服务关心的查询结论：
//! 终态（PROCESSED/INVALID）、继续等待（REGISTERED/PROCESSING）、
//! 远端未知（204）。限流（429）单独成错误类型，由对账循环
//! 按 Retry-After 暂停整轮扫描处理。

use std::time::Duration;

use loyalty_shared::LoyaltyError;
use loyalty_shared::config::AccrualConfig;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// 远端响应中的订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum RemoteStatus {
    Registered,
    Invalid,
    Processing,
    Processed,
}

/// 远端响应体
#[derive(Debug, Deserialize)]
struct RemoteReply {
    #[allow(dead_code)]
    order: String,
    status: RemoteStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    accrual: Option<Decimal>,
}

/// 一次查询的归约结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualLookup {
    /// 计算完成，携带返点金额
    Processed { accrual: Decimal },
    /// 订单不参与返点计算，终态
    Invalid,
    /// 远端仍在计算（REGISTERED/PROCESSING），稍后再查
    Pending,
    /// 远端尚未见到该订单（204）
    Unknown,
}

/// 积分计算服务客户端
#[derive(Clone)]
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(config: &AccrualConfig) -> Result<Self, LoyaltyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| LoyaltyError::Internal(format!("构建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 查询单个订单的计算状态
    pub async fn fetch(&self, number: &str) -> Result<AccrualLookup, LoyaltyError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoyaltyError::ExternalServiceTimeout {
                    service: "accrual".to_string(),
                }
            } else {
                LoyaltyError::ExternalService {
                    service: "accrual".to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        match response.status() {
            StatusCode::OK => {
                let reply: RemoteReply =
                    response
                        .json()
                        .await
                        .map_err(|e| LoyaltyError::ExternalService {
                            service: "accrual".to_string(),
                            message: format!("响应体解析失败: {}", e),
                        })?;

                debug!(order = number, status = ?reply.status, "accrual reply");

                Ok(match reply.status {
                    RemoteStatus::Processed => AccrualLookup::Processed {
                        // 远端偶尔在 PROCESSED 时也不带金额，按 0 处理
                        accrual: reply.accrual.unwrap_or(Decimal::ZERO),
                    },
                    RemoteStatus::Invalid => AccrualLookup::Invalid,
                    RemoteStatus::Registered | RemoteStatus::Processing => AccrualLookup::Pending,
                })
            }
            StatusCode::NO_CONTENT => Ok(AccrualLookup::Unknown),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);

                Err(LoyaltyError::RateLimited {
                    service: "accrual".to_string(),
                    retry_after_secs,
                })
            }
            status => Err(LoyaltyError::ExternalService {
                service: "accrual".to_string(),
                message: format!("意外的响应状态: {}", status),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_reply_deserialization() {
        let reply: RemoteReply = serde_json::from_str(
            r#"{"order":"12345678903","status":"PROCESSED","accrual":729.98}"#,
        )
        .unwrap();
        assert_eq!(reply.status, RemoteStatus::Processed);
        assert_eq!(reply.accrual, Some("729.98".parse().unwrap()));
    }

    #[test]
    fn test_remote_reply_without_accrual() {
        // PROCESSING 阶段远端不带 accrual 字段
        let reply: RemoteReply =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSING"}"#).unwrap();
        assert_eq!(reply.status, RemoteStatus::Processing);
        assert_eq!(reply.accrual, None);
    }

    #[test]
    fn test_remote_reply_rejects_unknown_status() {
        let result: std::result::Result<RemoteReply, _> =
            serde_json::from_str(r#"{"order":"1","status":"EXPLODED"}"#);
        assert!(result.is_err(), "未知状态应视为响应格式错误");
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let config = AccrualConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..AccrualConfig::default()
        };
        let client = AccrualClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
