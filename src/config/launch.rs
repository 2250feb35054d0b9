use anyhow::{Result, anyhow};
use reqwest::Proxy;

use super::GlobalConfig;

const DEFAULT_USER_AGENT: &str = concat!("donate-bridge/", env!("CARGO_PKG_VERSION"));

/// 按全局配置构建共享的 HTTP 客户端；单次请求超时由各 API 客户端自行设置。
pub fn build_http_client(global: &GlobalConfig) -> Result<reqwest::Client> {
    let agent = global
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|agent| !agent.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    let mut builder = reqwest::Client::builder().user_agent(agent);

    if let Some(proxy_url) = global.proxy.as_deref() {
        let trimmed = proxy_url.trim();
        if !trimmed.is_empty() {
            let proxy = Proxy::all(trimmed)
                .map_err(|err| anyhow!("global.proxy 地址无效 {trimmed}: {err}"))?;
            builder = builder.proxy(proxy);
        }
    }

    builder
        .build()
        .map_err(|err| anyhow!("构建 HTTP 客户端失败: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_and_without_proxy() {
        assert!(build_http_client(&GlobalConfig::default()).is_ok());
        let with_proxy = GlobalConfig {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            ..GlobalConfig::default()
        };
        assert!(build_http_client(&with_proxy).is_ok());
    }

    #[test]
    fn rejects_malformed_proxy() {
        let bad = GlobalConfig {
            proxy: Some("http://exa mple.com:8080".to_string()),
            ..GlobalConfig::default()
        };
        assert!(build_http_client(&bad).is_err());
    }
}
