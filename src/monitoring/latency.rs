use std::borrow::Cow;
use std::future::Future;

use tracing::Level;

use super::types::{LatencyGuard, LatencyMetadata};

pub fn guard_with_level(
    operation: impl Into<Cow<'static, str>>,
    level: Level,
    metadata: LatencyMetadata,
) -> LatencyGuard {
    LatencyGuard::new(operation, level, metadata)
}

/// 计时包装任意返回 `Result` 的 future，成功与失败都会记录。
pub async fn measure_result<Fut, T, E>(
    operation: impl Into<Cow<'static, str>>,
    level: Level,
    fut: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let guard = LatencyGuard::new(operation, level, LatencyMetadata::default());
    let res = fut.await;
    guard.finish();
    res
}
