use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingProfile {
    #[default]
    Lean,
    Verbose,
}

impl LoggingProfile {
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_logging_profile")]
    pub profile: LoggingProfile,
    #[serde(default = "super::default_slow_quote_warn_ms")]
    pub slow_quote_warn_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// 为空表示不启用 Prometheus 导出
    #[serde(default)]
    pub prometheus_listen: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default = "super::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "super::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "super::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "super::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "super::default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
    /// 持有已解锁账户的 JSON-RPC 节点地址
    #[serde(default)]
    pub rpc_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse empty toml");
        assert_eq!(config.bridge.request_timeout_ms, 30_000);
        assert_eq!(config.bridge.cache_ttl_secs, 300);
        assert_eq!(config.bridge.max_retries, 3);
        assert_eq!(config.global.logging.level, "info");
        assert_eq!(config.global.logging.profile, LoggingProfile::Lean);
        assert!(config.global.metrics.prometheus_listen.is_empty());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = r#"
            [global.logging]
            profile = "verbose"
            json = true

            [bridge]
            api_base_url = "http://127.0.0.1:9000"
            max_retries = 5
        "#;
        let config: AppConfig = toml::from_str(raw).expect("parse toml");
        assert!(config.global.logging.profile.is_verbose());
        assert!(config.global.logging.json);
        assert_eq!(config.bridge.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.bridge.max_retries, 5);
        assert_eq!(config.bridge.retry_base_delay_ms, 1_000);
    }
}
