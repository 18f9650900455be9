//! 重试策略与执行器
//!
//! 提供带抖动的指数退避重试机制，用于瞬时故障（网络抖动、外部服务
//! 临时不可用等）的自动恢复。业务逻辑错误（如参数无效）不应被重试——
//! 由调用方通过 `is_retryable` 闭包控制。

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::error::LoyaltyError;

// ---------------------------------------------------------------------------
// RetryPolicy — 重试策略配置
// ---------------------------------------------------------------------------

/// 重试策略配置
///
/// 使用指数退避避免重试风暴：首次失败等 initial_delay，之后按倍数增长，
/// 直到达到最大间隔或最大重试次数。在退避基础上叠加随机抖动，
/// 避免多个等待者同时醒来再次压垮下游。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: u32,
    /// 首次重试前的等待时间
    pub initial_delay: Duration,
    /// 退避时间上限，防止等待过长
    pub max_delay: Duration,
    /// 每次重试的退避倍数
    pub multiplier: f64,
    /// 抖动比例（0.0 表示无抖动，0.2 表示在基础值上下浮动 20%）
    pub jitter: f64,
}

impl Default for RetryPolicy {
    /// 默认策略：最多重试 3 次，初始等待 1 秒，最大等待 30 秒，
    /// 倍数 2.0，抖动 20%
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// 计算第 N 次重试的基础等待时间（attempt 从 0 开始，不含抖动）
    ///
    /// 公式: initial_delay * multiplier^attempt，结果不超过 max_delay。
    /// 使用 f64 运算后再转回 Duration，接受微秒级精度损失。
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// 在基础退避上叠加随机抖动
    ///
    /// 结果落在 [base * (1 - jitter), base * (1 + jitter)] 区间内，
    /// 且不超过 max_delay。
    pub fn jittered_delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter <= 0.0 {
            return base;
        }

        let base_ms = base.as_millis() as f64;
        let spread = base_ms * self.jitter;
        let jittered_ms = rand::rng().random_range((base_ms - spread)..=(base_ms + spread));
        let capped_ms = jittered_ms
            .max(0.0)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// 是否应继续重试
    ///
    /// attempt 表示已经失败的次数（从 0 开始计数的重试轮次），
    /// 当 attempt < max_retries 时返回 true。
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

// ---------------------------------------------------------------------------
// retry_with_policy — 带重试的异步执行器
// ---------------------------------------------------------------------------

/// 带重试的异步执行器
///
/// 对任意异步操作应用重试策略。仅在操作返回可重试错误时才重试，
/// 业务逻辑错误（如参数无效）不会被重试，直接向上传播。
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&LoyaltyError) -> bool,
    mut operation: F,
) -> Result<T, LoyaltyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LoyaltyError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "操作在重试后成功");
                }
                return Ok(value);
            }
            Err(err) => {
                // 非瞬时错误不重试，直接返回
                if !is_retryable(&err) {
                    warn!(
                        operation = operation_name,
                        error = %err,
                        "操作失败且不可重试，直接返回错误"
                    );
                    return Err(err);
                }

                // 已用尽重试次数
                if !policy.should_retry(attempt) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "已达最大重试次数，放弃重试"
                    );
                    return Err(err);
                }

                let delay = policy.jittered_delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "操作失败，将在退避后重试"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_for_attempt_exponential_backoff() {
        let policy = RetryPolicy::default();

        // attempt 0: 1s * 2^0 = 1s
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        // attempt 1: 1s * 2^1 = 2s
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        // attempt 2: 1s * 2^2 = 4s
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        // attempt 3: 1s * 2^3 = 8s
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.0,
        };

        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        // attempt 3: 8s -> 受限于 max_delay -> 5s
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(5));
        // attempt 10: 仍受限于 max_delay -> 5s
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jittered_delay_within_bounds() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.2,
        };

        // 抖动是随机的，多采样验证始终落在 [0.8x, 1.2x] 区间
        for _ in 0..100 {
            let d = policy.jittered_delay_for_attempt(1).as_millis() as f64;
            assert!((1600.0..=2400.0).contains(&d), "jittered delay out of range: {}", d);
        }
    }

    #[test]
    fn test_zero_jitter_equals_base() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.jittered_delay_for_attempt(2),
            policy.delay_for_attempt(2)
        );
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy {
            max_retries: 3,
            ..RetryPolicy::default()
        };

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        // 第 3 次（已重试 3 次）不再重试
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[tokio::test]
    async fn test_retry_with_policy_succeeds_first_try() {
        let policy = RetryPolicy::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = call_count.clone();

        let result = retry_with_policy(
            &policy,
            "test_op",
            |_| true,
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, LoyaltyError>(42)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        // 首次即成功，只调用 1 次
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_with_policy_succeeds_after_retries() {
        // 使用极短的退避时间，避免测试等待过久
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: 0.0,
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = call_count.clone();

        let result = retry_with_policy(
            &policy,
            "test_op",
            |_| true,
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        // 前两次失败
                        Err(LoyaltyError::ExternalService {
                            service: "accrual".to_string(),
                            message: "模拟瞬时故障".to_string(),
                        })
                    } else {
                        // 第三次成功
                        Ok(99)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_with_policy_exhausts_retries() {
        let policy = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: 0.0,
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = call_count.clone();

        let result: Result<i32, _> = retry_with_policy(
            &policy,
            "test_op",
            |_| true,
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LoyaltyError::ExternalServiceTimeout {
                        service: "accrual".to_string(),
                    })
                }
            },
        )
        .await;

        assert!(result.is_err());
        // 首次执行 + 2 次重试 = 3 次调用
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_with_policy_respects_is_retryable() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: 0.0,
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = call_count.clone();

        let result: Result<i32, _> = retry_with_policy(
            &policy,
            "test_op",
            |e| e.is_retryable(),
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LoyaltyError::Validation("不可重试".to_string()))
                }
            },
        )
        .await;

        assert!(result.is_err());
        // 验证错误不重试，只调用 1 次
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
