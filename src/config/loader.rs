use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::AppConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["donate-bridge.toml", "config/donate-bridge.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 显式路径不存在时同样回退到默认配置。
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            config.bridge.validate()?;
            return Ok(config);
        }
    }

    Ok(AppConfig::default())
}

fn try_load_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(Some(dir.path().join("absent.toml"))).expect("load");
        assert_eq!(config.bridge.api_base_url, "https://app.across.to/api");
    }

    #[test]
    fn reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[bridge]\napi_base_url = \"http://localhost:3000/api\"\ncache_ttl_secs = 60"
        )
        .expect("write config");
        let config = load_config(Some(file.path().to_path_buf())).expect("load");
        assert_eq!(config.bridge.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.bridge.cache_ttl_secs, 60);
    }

    #[test]
    fn parse_errors_carry_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[bridge\nbroken").expect("write config");
        let err = load_config(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[bridge]\nrequest_timeout_ms = 0").expect("write config");
        let err = load_config(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bundled_template_matches_defaults() {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/donate-bridge.toml"));
        let parsed: AppConfig = toml::from_str(raw).expect("template parses");
        parsed.bridge.validate().expect("template validates");
        assert_eq!(parsed.bridge.max_retries, 3);
        assert_eq!(parsed.bridge.api_base_url, "https://app.across.to/api");
        assert!(parsed.wallet.rpc_url.is_empty());
    }
}
