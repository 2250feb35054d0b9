use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::monitoring::metrics::prometheus_enabled;

use super::classify::is_user_rejection;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// 指数退避重试参数：第 n 次重试前等待 `base_delay * 2^(n-1)`。
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// `attempt` 从 1 开始计数，返回该次失败后、下一次尝试前的等待时长。
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// 通用重试：除用户拒签以外的失败均会重试，耗尽后返回最后一次的错误。
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(operation, |err: &E| !is_user_rejection(&err.to_string()))
            .await
    }

    pub async fn run_if<T, E, F, Fut, P>(&self, mut operation: F, should_retry: P) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) {
                debug!(
                    target: "bridge::retry",
                    attempt,
                    error = %err,
                    "错误不可重试，直接返回"
                );
                return Err(err);
            }
            if attempt >= self.max_attempts {
                warn!(
                    target: "bridge::retry",
                    attempts = attempt,
                    error = %err,
                    "重试次数耗尽"
                );
                return Err(err);
            }

            let delay = self.delay_after(attempt);
            info!(
                target: "bridge::retry",
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "操作失败，退避后重试"
            );
            if prometheus_enabled() {
                counter!("donate_bridge_retry_total").increment(1);
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// 以默认退避基数执行 [`RetryPolicy::run`]。
pub async fn retry_operation<T, E, F, Fut>(operation: F, max_retries: u32) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_retries, DEFAULT_BASE_DELAY)
        .run(operation)
        .await
}
