use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

static EXPORTER: OnceCell<SocketAddr> = OnceCell::new();
static PROMETHEUS_ENABLED: AtomicBool = AtomicBool::new(false);

/// 监听地址为空时不启用导出器，返回 `Ok(None)`。
pub fn try_init_prometheus(listen: &str) -> Result<Option<SocketAddr>> {
    let listen = listen.trim();
    if listen.is_empty() {
        return Ok(None);
    }
    EXPORTER
        .get_or_try_init(|| {
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("invalid prometheus listen address: {listen}"))?;
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("failed to install prometheus exporter")?;
            PROMETHEUS_ENABLED.store(true, Ordering::Relaxed);
            Ok(addr)
        })
        .map(|addr| Some(*addr))
}

pub fn prometheus_enabled() -> bool {
    PROMETHEUS_ENABLED.load(Ordering::Relaxed)
}
