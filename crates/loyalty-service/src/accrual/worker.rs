//! 后台对账循环
//!
//! 订单提交路径只负责登记并立刻返回 202，与外部积分服务的
//! 全部交互都发生在这里：提交时通过 `ReconcilerHandle` 即时
//! 入队一次，周期扫描兜底（进程重启、入队丢失、上一轮预算
//! 耗尽的订单都由扫描捞回）。
//!
//! 限流处理是按整轮扫描暂停而不是按单个订单：远端发出 429 时
//! 继续轮询其他订单只会加剧限流。

use std::sync::Arc;
use std::time::Duration;

use loyalty_shared::LoyaltyError;
use loyalty_shared::config::AccrualConfig;
use loyalty_shared::retry::RetryPolicy;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::client::{AccrualClient, AccrualLookup};
use crate::error::Result;
use crate::models::Order;
use crate::repository::{BalanceLedger, OrderRegistry};

/// 入队句柄
///
/// 提交路径持有它做 fire-and-forget 通知；队列满或 worker
/// 已退出时静默放弃，周期扫描会兜底。
#[derive(Clone)]
pub struct ReconcilerHandle {
    tx: mpsc::Sender<String>,
}

impl ReconcilerHandle {
    pub fn enqueue(&self, number: &str) {
        if let Err(e) = self.tx.try_send(number.to_string()) {
            debug!(order = number, error = %e, "对账入队失败，等待周期扫描");
        }
    }

    /// 测试用：脱离 worker 构造句柄，暴露接收端以便断言入队动作
    #[cfg(test)]
    pub(crate) fn for_tests() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        (Self { tx }, rx)
    }
}

/// 单个订单一轮对账的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReconcileStep {
    /// 已到终态并完成账本写入
    Settled,
    /// 预算内未到终态，留给下一轮扫描
    StillPending,
    /// 远端限流，携带建议等待秒数
    RateLimited(u64),
}

/// 后台对账 worker
///
/// 持有订单仓储与余额账本的抽象接口，便于注入 mock 测试。
pub struct ReconciliationWorker<R, L>
where
    R: OrderRegistry,
    L: BalanceLedger,
{
    orders: Arc<R>,
    ledger: Arc<L>,
    client: AccrualClient,
    config: AccrualConfig,
    policy: RetryPolicy,
    queue: mpsc::Receiver<String>,
    shutdown: watch::Receiver<bool>,
}

impl<R, L> ReconciliationWorker<R, L>
where
    R: OrderRegistry,
    L: BalanceLedger,
{
    pub fn new(
        orders: Arc<R>,
        ledger: Arc<L>,
        client: AccrualClient,
        config: AccrualConfig,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, ReconcilerHandle) {
        let (tx, queue) = mpsc::channel(1024);

        let policy = RetryPolicy {
            max_retries: config.max_attempts.saturating_sub(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            multiplier: 2.0,
            jitter: 0.2,
        };

        let worker = Self {
            orders,
            ledger,
            client,
            config,
            policy,
            queue,
            shutdown,
        };

        (worker, ReconcilerHandle { tx })
    }

    /// 主循环：即时入队与周期扫描二选一推进，直到收到关停信号
    pub async fn run(mut self) {
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            batch_size = self.config.batch_size,
            max_attempts = self.config.max_attempts,
            "对账循环已启动"
        );

        let mut tick =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_seconds));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                res = self.shutdown.changed() => {
                    if res.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                maybe = self.queue.recv() => match maybe {
                    Some(number) => self.reconcile_by_number(&number).await,
                    // 所有入队句柄都已释放，只剩周期扫描没有意义——
                    // 这只会发生在进程关停路径上
                    None => break,
                },
                _ = tick.tick() => self.sweep().await,
            }
        }

        info!("对账循环退出");
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// 可被关停信号打断的等待；返回 true 表示应当停止
    async fn sleep_or_shutdown(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            res = self.shutdown.changed() => res.is_err() || *self.shutdown.borrow(),
        }
    }

    /// 周期扫描：认领一批待对账订单逐个处理
    async fn sweep(&mut self) {
        let batch = match self.orders.claim_pending(self.config.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "认领待对账订单失败");
                return;
            }
        };

        if batch.is_empty() {
            return;
        }

        info!(count = batch.len(), "开始对账扫描");

        for order in batch {
            if self.shutdown_requested() {
                return;
            }

            if let ReconcileStep::RateLimited(secs) = self.reconcile_order(&order).await {
                warn!(retry_after_secs = secs, "积分计算服务限流，暂停本轮扫描");
                self.sleep_or_shutdown(Duration::from_secs(secs)).await;
                // 剩余订单留给下一轮扫描
                return;
            }
        }
    }

    /// 即时入队路径：提交成功后的首次对账
    async fn reconcile_by_number(&mut self, number: &str) {
        match self.orders.get(number).await {
            Ok(Some(order)) if !order.status.is_terminal() => {
                // 推进到 PROCESSING，让订单列表立刻反映对账进度
                if let Err(e) = self.orders.mark_processing(number).await {
                    warn!(order = number, error = %e, "标记 PROCESSING 失败");
                }

                if let ReconcileStep::RateLimited(secs) = self.reconcile_order(&order).await {
                    warn!(retry_after_secs = secs, "积分计算服务限流，暂停即时对账");
                    self.sleep_or_shutdown(Duration::from_secs(secs)).await;
                }
            }
            // 终态订单不再联系外部服务，直接返回缓存状态的语义
            // 由提交路径保证，这里只需要跳过
            Ok(_) => {}
            Err(e) => error!(order = number, error = %e, "查询订单失败"),
        }
    }

    /// 单个订单的一轮对账：预算内带退避地查询，终态即落账
    ///
    /// 预算耗尽时订单保持非终态，等待下一轮扫描；绝不凭空
    /// 标记 PROCESSED/INVALID。
    async fn reconcile_order(&mut self, order: &Order) -> ReconcileStep {
        let mut attempt: u32 = 0;

        loop {
            if self.shutdown_requested() {
                return ReconcileStep::StillPending;
            }

            match self.client.fetch(&order.number).await {
                Ok(lookup @ (AccrualLookup::Processed { .. } | AccrualLookup::Invalid)) => {
                    return match self.apply_lookup(order, lookup).await {
                        Ok(()) => ReconcileStep::Settled,
                        Err(e) => {
                            error!(order = %order.number, error = %e, "账本写入失败");
                            ReconcileStep::StillPending
                        }
                    };
                }
                // 远端仍在计算或尚未见到订单：消耗一次预算后退避重查
                Ok(AccrualLookup::Pending | AccrualLookup::Unknown) => {}
                // 限流不消耗预算，交由上层暂停整轮扫描
                Err(LoyaltyError::RateLimited {
                    retry_after_secs, ..
                }) => return ReconcileStep::RateLimited(retry_after_secs),
                Err(e) if e.is_retryable() => {
                    warn!(order = %order.number, attempt, error = %e, "查询积分服务失败");
                }
                Err(e) => {
                    error!(order = %order.number, error = %e, "查询积分服务遇到不可重试错误");
                    return ReconcileStep::StillPending;
                }
            }

            attempt += 1;
            if attempt >= self.config.max_attempts {
                debug!(order = %order.number, "本轮查询预算耗尽，留待下一轮扫描");
                return ReconcileStep::StillPending;
            }

            let delay = self.policy.jittered_delay_for_attempt(attempt - 1);
            if self.sleep_or_shutdown(delay).await {
                return ReconcileStep::StillPending;
            }
        }
    }

    /// 把终态查询结论落到存储
    ///
    /// PROCESSED 的入账与订单终态写入在账本仓储的同一事务内完成，
    /// 重复应用是无害的空操作。
    async fn apply_lookup(&self, order: &Order, lookup: AccrualLookup) -> Result<()> {
        match lookup {
            AccrualLookup::Processed { accrual } => {
                let credited = self
                    .ledger
                    .credit_for_processed_order(&order.login, &order.number, accrual)
                    .await?;
                if credited {
                    info!(
                        order = %order.number,
                        login = %order.login,
                        accrual = %accrual,
                        "订单结算入账"
                    );
                } else {
                    debug!(order = %order.number, "订单已是终态，跳过入账");
                }
            }
            AccrualLookup::Invalid => {
                let marked = self.orders.mark_invalid(&order.number).await?;
                if marked {
                    info!(order = %order.number, "订单被判定为无效");
                }
            }
            AccrualLookup::Pending | AccrualLookup::Unknown => {}
        }

        Ok(())
    }
}
