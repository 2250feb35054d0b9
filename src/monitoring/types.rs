use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::Level;

#[derive(Debug, Clone, Default)]
pub struct LatencyMetadata {
    fields: Arc<BTreeMap<String, String>>,
}

impl LatencyMetadata {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self {
            fields: Arc::new(fields),
        }
    }

    fn summary(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        Some(
            self.fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// 计时守卫：显式 `finish` 或 drop 时记录一次耗时，重复调用只记录一次。
#[derive(Debug)]
pub struct LatencyGuard {
    operation: Cow<'static, str>,
    start: Instant,
    level: Level,
    metadata: LatencyMetadata,
    ended: AtomicBool,
}

impl LatencyGuard {
    pub fn new(
        operation: impl Into<Cow<'static, str>>,
        level: Level,
        metadata: LatencyMetadata,
    ) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
            level,
            metadata,
            ended: AtomicBool::new(false),
        }
    }

    pub fn finish(&self) -> Duration {
        let elapsed = self.start.elapsed();
        self.log_once(elapsed);
        elapsed
    }

    fn log_once(&self, elapsed: Duration) {
        if !self.ended.swap(true, Ordering::SeqCst) {
            log_latency(self.level, &self.operation, elapsed, &self.metadata);
        }
    }
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.log_once(elapsed);
    }
}

fn log_latency(level: Level, operation: &str, elapsed: Duration, metadata: &LatencyMetadata) {
    let elapsed_us = elapsed.as_micros() as u64;
    let elapsed_ms = format!("{:.3}", elapsed.as_secs_f64() * 1_000.0);
    let metadata = metadata.summary().unwrap_or_default();

    macro_rules! log_event {
        ($macro:ident) => {
            tracing::$macro!(
                target: "latency",
                %operation,
                elapsed_us,
                elapsed_ms = %elapsed_ms,
                metadata = %metadata,
                "耗时统计"
            )
        };
    }

    match level {
        Level::ERROR => log_event!(error),
        Level::WARN => log_event!(warn),
        Level::INFO => log_event!(info),
        Level::DEBUG => log_event!(debug),
        Level::TRACE => log_event!(trace),
    }
}
