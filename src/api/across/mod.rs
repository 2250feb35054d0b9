//! Across 跨链兑换 API 客户端，实现报价、链/代币列表与充值状态查询。
//!
//! 模块只负责网络交互与响应归一化，错误归类与缓存由 `bridge` 层处理。

pub mod actions;
pub mod quote;
pub mod types;

use std::{error::Error as StdError, fmt, time::Duration};

use metrics::{counter, histogram};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{Level, debug, trace, warn};

use crate::config::{BridgeConfig, LoggingConfig, LoggingProfile};
use crate::monitoring::metrics::prometheus_enabled;
use crate::monitoring::{LatencyMetadata, guard_with_level};

use self::actions::ActionsBody;
use self::types::{list_items, parse_list};

pub use actions::{
    Action, ActionArg, DonationActionParams, SubscriptionSignature, build_donation_actions,
};
pub use quote::{FeeBreakdown, Quote, QuoteParams, QuoteRequest, TransactionDescriptor};
pub use types::{ChainInfo, DepositStatus, TokenInfo};

#[derive(Debug, Error)]
pub enum AcrossError {
    #[error("failed to call Across API: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API request to {endpoint} failed with status {status}: {body}")]
    ApiStatus {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response schema: {0}")]
    Schema(String),
}

impl AcrossError {
    pub fn describe(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut current = StdError::source(self);
        while let Some(source) = current {
            let text = source.to_string();
            if parts.last().map(|last| last == &text).unwrap_or(false) {
                current = source.source();
                continue;
            }
            parts.push(text);
            current = source.source();
        }
        parts.join(" | caused by: ")
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AcrossError::Http(err) if err.is_timeout())
    }
}

#[derive(Clone)]
pub struct AcrossApiClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    log_profile: LoggingProfile,
    slow_request_warn_ms: u64,
}

impl fmt::Debug for AcrossApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcrossApiClient")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("log_profile", &self.log_profile)
            .field("slow_request_warn_ms", &self.slow_request_warn_ms)
            .finish()
    }
}

impl AcrossApiClient {
    pub fn new(client: reqwest::Client, bridge: &BridgeConfig, logging: &LoggingConfig) -> Self {
        let trimmed = bridge.api_base_url.trim();
        let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        Self {
            base_url: normalized,
            client,
            request_timeout: Duration::from_millis(bridge.request_timeout_ms),
            log_profile: logging.profile,
            slow_request_warn_ms: logging.slow_quote_warn_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn quote(&self, request: &QuoteRequest<'_>) -> Result<Quote, AcrossError> {
        let url = self.endpoint("/swap/approval");
        debug!(
            target: "across::quote",
            origin_chain_id = request.origin_chain_id,
            destination_chain_id = request.destination_chain_id,
            input_token = request.input_token,
            amount = request.amount,
            "开始请求 Across 报价"
        );
        let builder = self.client.get(&url).query(request);
        let value = self.send("quote", url, builder).await?;
        let quote = Quote::from_value(
            &value,
            request.origin_chain_id,
            request.destination_chain_id,
        );
        debug!(
            target: "across::quote",
            expected_output = %quote.expected_output_amount,
            min_output = %quote.min_output_amount,
            fill_time_secs = quote.expected_fill_time,
            approvals = quote.approval_txns.len(),
            "报价响应成功"
        );
        Ok(quote)
    }

    pub async fn quote_with_actions(
        &self,
        request: &QuoteRequest<'_>,
        actions: &[Action],
    ) -> Result<Quote, AcrossError> {
        let url = self.endpoint("/swap/approval");
        let body = serde_json::to_value(ActionsBody { actions })?;
        trace!(
            target: "across::quote",
            payload = %body,
            "即将发起带附加动作的报价请求"
        );
        let builder = self.client.post(&url).query(request).json(&body);
        let value = self.send("quote_with_actions", url, builder).await?;
        Ok(Quote::from_value(
            &value,
            request.origin_chain_id,
            request.destination_chain_id,
        ))
    }

    pub async fn chains(&self) -> Result<Vec<ChainInfo>, AcrossError> {
        let url = self.endpoint("/swap/chains");
        let builder = self.client.get(&url);
        let value = self.send("chains", url, builder).await?;
        let items = list_items(&value, "chains")
            .ok_or_else(|| AcrossError::Schema("chains 响应不是数组".to_string()))?;
        Ok(parse_list(items, "chains", ChainInfo::from_value))
    }

    /// 指定 `chain_id` 时只保留该链的代币。
    pub async fn tokens(&self, chain_id: Option<u64>) -> Result<Vec<TokenInfo>, AcrossError> {
        let url = self.endpoint("/swap/tokens");
        let mut builder = self.client.get(&url);
        if let Some(id) = chain_id {
            builder = builder.query(&[("chainId", id)]);
        }
        let value = self.send("tokens", url, builder).await?;
        let items = list_items(&value, "tokens")
            .ok_or_else(|| AcrossError::Schema("tokens 响应不是数组".to_string()))?;
        let mut tokens = parse_list(items, "tokens", TokenInfo::from_value);
        if let Some(id) = chain_id {
            tokens.retain(|token| token.chain_id == id);
        }
        Ok(tokens)
    }

    pub async fn deposit_status(
        &self,
        deposit_id: &str,
        origin_chain_id: u64,
    ) -> Result<DepositStatus, AcrossError> {
        let url = self.endpoint("/deposit/status");
        let origin = origin_chain_id.to_string();
        let builder = self
            .client
            .get(&url)
            .query(&[("depositId", deposit_id), ("originChainId", origin.as_str())]);
        let value = self.send("deposit_status", url, builder).await?;
        Ok(DepositStatus::from_value(&value))
    }

    async fn send(
        &self,
        stage: &'static str,
        url: String,
        builder: RequestBuilder,
    ) -> Result<Value, AcrossError> {
        let metadata = LatencyMetadata::new(
            [
                ("stage".to_string(), stage.to_string()),
                ("url".to_string(), url.clone()),
            ]
            .into_iter()
            .collect(),
        );
        let latency_level = if self.log_profile.is_verbose() {
            Level::INFO
        } else {
            Level::DEBUG
        };
        let guard = guard_with_level(format!("across.{stage}"), latency_level, metadata);

        let response = match builder.timeout(self.request_timeout).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let error = AcrossError::from(err);
                warn!(
                    target: "across::http",
                    stage,
                    url = %url,
                    timeout = error.is_timeout(),
                    error = %error.describe(),
                    "请求发送失败"
                );
                self.record_metrics(stage, "transport_error", None);
                return Err(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|err| format!("<body decode failed: {err}>"));
            warn!(
                target: "across::http",
                stage,
                status = status.as_u16(),
                endpoint = %url,
                body = %summarize_error_body(&body),
                "请求返回非 2xx 状态"
            );
            self.record_metrics(stage, "http_error", None);
            return Err(AcrossError::ApiStatus {
                endpoint: url,
                status,
                body,
            });
        }

        let value: Value = match response.json().await {
            Ok(val) => val,
            Err(err) => {
                let error = AcrossError::from(err);
                warn!(
                    target: "across::http",
                    stage,
                    endpoint = %url,
                    status = status.as_u16(),
                    error = %error.describe(),
                    "响应解析失败"
                );
                self.record_metrics(stage, "decode_error", None);
                return Err(error);
            }
        };

        let elapsed = guard.finish();
        let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
        self.record_metrics(stage, "success", Some(elapsed_ms));
        if elapsed_ms > self.slow_request_warn_ms as f64 {
            warn!(
                target: "across::http",
                stage,
                endpoint = %url,
                elapsed_ms = format_args!("{elapsed_ms:.3}"),
                threshold_ms = self.slow_request_warn_ms,
                "请求耗时超过阈值"
            );
        }
        Ok(value)
    }

    fn record_metrics(&self, stage: &'static str, outcome: &'static str, elapsed_ms: Option<f64>) {
        if prometheus_enabled() {
            counter!(
                "donate_bridge_api_total",
                "stage" => stage,
                "outcome" => outcome,
            )
            .increment(1);
            if let Some(value) = elapsed_ms {
                histogram!("donate_bridge_api_latency_ms", "stage" => stage).record(value);
            }
        }
    }
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response body)".to_string()
    } else {
        let mut single_line = trimmed.replace(['\n', '\r'], " ");
        const MAX_LEN: usize = 512;
        if single_line.len() > MAX_LEN {
            let mut cut = MAX_LEN;
            while !single_line.is_char_boundary(cut) {
                cut -= 1;
            }
            single_line.truncate(cut);
            single_line.push('…');
        }
        single_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_summary_is_single_line_and_bounded() {
        assert_eq!(summarize_error_body("  "), "(empty response body)");
        assert_eq!(summarize_error_body("a\nb\rc"), "a b c");
        let long = "é".repeat(400);
        let summary = summarize_error_body(&long);
        assert!(summary.len() <= 512 + '…'.len_utf8());
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn base_url_gets_scheme_and_endpoint_joins_cleanly() {
        let bridge = BridgeConfig {
            api_base_url: "app.across.to/api/".to_string(),
            ..BridgeConfig::default()
        };
        let client = AcrossApiClient::new(reqwest::Client::new(), &bridge, &LoggingConfig::default());
        assert_eq!(client.base_url(), "https://app.across.to/api/");
        assert_eq!(
            client.endpoint("/swap/chains"),
            "https://app.across.to/api/swap/chains"
        );
    }
}
