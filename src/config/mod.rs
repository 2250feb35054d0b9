use std::time::Duration;

pub mod launch;
pub mod loader;
pub mod types;

pub use launch::build_http_client;
pub use loader::*;
pub use types::*;

use self::types as cfg;

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_logging_profile() -> cfg::LoggingProfile {
    cfg::LoggingProfile::Lean
}

pub(crate) fn default_slow_quote_warn_ms() -> u64 {
    1_500
}

pub(crate) fn default_api_base_url() -> String {
    "https://app.across.to/api".to_string()
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_cache_ttl_secs() -> u64 {
    300
}

pub(crate) fn default_max_retries() -> u32 {
    3
}

pub(crate) fn default_retry_base_delay_ms() -> u64 {
    1_000
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: default_logging_profile(),
            slow_quote_warn_ms: default_slow_quote_warn_ms(),
        }
    }
}

impl Default for cfg::BridgeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl cfg::BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(self.api_base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!(
                "bridge.api_base_url 无效 {}: {err}",
                self.api_base_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "bridge.api_base_url 仅支持 http/https: {}",
                self.api_base_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "bridge.request_timeout_ms 必须大于 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "bridge.max_retries 至少为 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
