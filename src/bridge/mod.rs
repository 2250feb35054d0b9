//! 捐赠跨链兑换服务：报价、执行、充值状态查询与链/代币列表缓存。

pub mod cache;
pub mod classify;
pub mod error;
pub mod executor;
pub mod retry;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::api::across::{
    AcrossApiClient, AcrossError, Action, ChainInfo, DepositStatus, Quote, QuoteParams,
    QuoteRequest, TokenInfo,
};
use crate::config::BridgeConfig;
use crate::monitoring::events;
use crate::wallet::WalletService;

pub use cache::ResourceCache;
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use retry::{RetryPolicy, retry_operation};
pub use validation::is_same_token_transfer;

use self::classify::handle_api_error;
use self::validation::{is_positive_integer_string, is_valid_address};

/// 捐赠统一结算到 Base 链。
pub const DESTINATION_CHAIN_ID: u64 = 8453;
/// Base 上的 USDC。
pub const DESTINATION_TOKEN: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
/// 目标链上负责执行附加动作的 multicall handler。
pub const MULTICALL_HANDLER: &str = "0x924a9f036260DdD5808007E1AA95f08eD08aA569";
pub const APP_FEE: &str = "0.0025";
pub const APP_FEE_RECIPIENT: &str = "0x9A3f6E1c2B8d47a5E0c3F9b21D6e48A7c5B0d3E1";
pub const TRADE_TYPE_MIN_OUTPUT: &str = "minOutput";

impl From<AcrossError> for BridgeError {
    fn from(err: AcrossError) -> Self {
        match err {
            AcrossError::ApiStatus { status, body, .. } => handle_api_error(status, &body),
            other => BridgeError::network(other.describe()),
        }
    }
}

pub struct AcrossService {
    api: AcrossApiClient,
    cache: ResourceCache,
    wallet: Option<Arc<dyn WalletService>>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for AcrossService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcrossService")
            .field("api", &self.api)
            .field("cache", &self.cache)
            .field("wallet", &self.wallet.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}

impl AcrossService {
    pub fn new(api: AcrossApiClient, config: &BridgeConfig) -> Self {
        Self {
            api,
            cache: ResourceCache::new(config.cache_ttl()),
            wallet: None,
            retry: RetryPolicy::new(config.max_retries, config.retry_base_delay()),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletService>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub async fn get_quote(&self, params: &QuoteParams) -> BridgeResult<Quote> {
        let result = match validate_quote_params(params) {
            Ok(()) => {
                let request = quote_request(params, &params.recipient);
                self.api.quote(&request).await.map_err(BridgeError::from)
            }
            Err(err) => Err(err),
        };
        finish_quote(params.origin_chain_id, result, false)
    }

    /// 目标链到账后由 multicall handler 原子执行 `actions`，收款方因此固定为 handler。
    pub async fn get_quote_with_actions(
        &self,
        params: &QuoteParams,
        actions: &[Action],
    ) -> BridgeResult<Quote> {
        let validated = validate_quote_params(params).and_then(|()| {
            if actions.is_empty() {
                Err(BridgeError::invalid_params("actions must not be empty"))
            } else {
                Ok(())
            }
        });
        let result = match validated {
            Ok(()) => {
                let request = quote_request(params, MULTICALL_HANDLER);
                self.api
                    .quote_with_actions(&request, actions)
                    .await
                    .map_err(BridgeError::from)
            }
            Err(err) => Err(err),
        };
        finish_quote(params.origin_chain_id, result, true)
    }

    pub async fn execute_swap(&self, quote: &Quote) -> BridgeResult<String> {
        let wallet = self
            .wallet
            .as_deref()
            .ok_or_else(|| BridgeError::invalid_params("no wallet attached to the service"))?;
        executor::execute_swap(wallet, quote).await
    }

    pub async fn get_deposit_status(
        &self,
        deposit_id: &str,
        origin_chain_id: u64,
    ) -> BridgeResult<DepositStatus> {
        if deposit_id.trim().is_empty() {
            return Err(BridgeError::invalid_params("deposit id is empty"));
        }
        self.retry
            .run_if(
                || async {
                    self.api
                        .deposit_status(deposit_id, origin_chain_id)
                        .await
                        .map_err(BridgeError::from)
                },
                is_transient,
            )
            .await
    }

    /// 轮询充值状态直到终态或超过 `deadline`，超时返回最后一次查询结果。
    pub async fn wait_for_fill(
        &self,
        deposit_id: &str,
        origin_chain_id: u64,
        interval: Duration,
        deadline: Duration,
    ) -> BridgeResult<DepositStatus> {
        let started = tokio::time::Instant::now();
        loop {
            let status = self.get_deposit_status(deposit_id, origin_chain_id).await?;
            if status.is_terminal() || started.elapsed() + interval > deadline {
                info!(
                    target: "bridge::status",
                    deposit_id,
                    status = status.label(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "充值状态轮询结束"
                );
                return Ok(status);
            }
            debug!(
                target: "bridge::status",
                deposit_id,
                status = status.label(),
                "充值尚未完成，继续轮询"
            );
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn get_supported_chains(&self) -> BridgeResult<Arc<Vec<ChainInfo>>> {
        if let Some(chains) = self.cache.chains() {
            events::cache_lookup("chains", true);
            return Ok(chains);
        }
        events::cache_lookup("chains", false);
        let chains = self
            .retry
            .run_if(
                || async { self.api.chains().await.map_err(BridgeError::from) },
                is_transient,
            )
            .await?;
        Ok(self.cache.store_chains(chains))
    }

    pub async fn get_supported_tokens(&self, chain_id: u64) -> BridgeResult<Arc<Vec<TokenInfo>>> {
        if let Some(tokens) = self.cache.tokens(chain_id) {
            events::cache_lookup("tokens", true);
            return Ok(tokens);
        }
        events::cache_lookup("tokens", false);
        let tokens = self.fetch_tokens(Some(chain_id)).await?;
        Ok(self.cache.store_tokens(chain_id, tokens))
    }

    /// 全量代币列表，不走缓存。
    pub async fn get_all_supported_tokens(&self) -> BridgeResult<Vec<TokenInfo>> {
        self.fetch_tokens(None).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!(target: "bridge::cache", "资源缓存已清空");
    }

    async fn fetch_tokens(&self, chain_id: Option<u64>) -> BridgeResult<Vec<TokenInfo>> {
        self.retry
            .run_if(
                || async { self.api.tokens(chain_id).await.map_err(BridgeError::from) },
                is_transient,
            )
            .await
    }
}

fn is_transient(err: &BridgeError) -> bool {
    err.kind().is_transient()
}

fn validate_quote_params(params: &QuoteParams) -> BridgeResult<()> {
    if params.origin_chain_id == 0 {
        return Err(BridgeError::invalid_params("origin chain id must be positive"));
    }
    if !is_positive_integer_string(&params.amount) {
        return Err(BridgeError::invalid_params(format!(
            "amount must be a positive integer string: {}",
            params.amount
        )));
    }
    for (field, value) in [
        ("inputToken", &params.input_token),
        ("depositor", &params.depositor),
        ("recipient", &params.recipient),
    ] {
        if !is_valid_address(value) {
            return Err(BridgeError::invalid_params(format!(
                "{field} is not a valid address: {value}"
            )));
        }
    }
    Ok(())
}

fn quote_request<'a>(params: &'a QuoteParams, recipient: &'a str) -> QuoteRequest<'a> {
    QuoteRequest {
        trade_type: TRADE_TYPE_MIN_OUTPUT,
        amount: &params.amount,
        input_token: &params.input_token,
        output_token: DESTINATION_TOKEN,
        origin_chain_id: params.origin_chain_id,
        destination_chain_id: DESTINATION_CHAIN_ID,
        depositor: &params.depositor,
        recipient,
        app_fee: APP_FEE,
        app_fee_recipient: APP_FEE_RECIPIENT,
    }
}

fn finish_quote(
    origin_chain_id: u64,
    result: BridgeResult<Quote>,
    with_actions: bool,
) -> BridgeResult<Quote> {
    match &result {
        Ok(quote) => events::quote_ready(quote, with_actions),
        Err(err) => events::quote_failed(origin_chain_id, err),
    }
    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::across::ActionArg;
    use crate::config::LoggingConfig;

    const DEPOSITOR: &str = "0x5c7BCd6E7De5423a257D81B442095A1a6ced35C5";
    const USDC_MAINNET: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    fn service_for(server: &MockServer) -> AcrossService {
        let config = BridgeConfig {
            api_base_url: server.uri(),
            retry_base_delay_ms: 1,
            ..BridgeConfig::default()
        };
        let api = AcrossApiClient::new(reqwest::Client::new(), &config, &LoggingConfig::default());
        AcrossService::new(api, &config)
    }

    fn params(origin_chain_id: u64) -> QuoteParams {
        QuoteParams {
            origin_chain_id,
            input_token: USDC_MAINNET.to_string(),
            amount: "1000000".to_string(),
            depositor: DEPOSITOR.to_string(),
            recipient: DEPOSITOR.to_string(),
        }
    }

    fn swap_only_body() -> serde_json::Value {
        json!({"swapTx": {"to": DEPOSITOR, "data": "0xabcdef"}})
    }

    #[tokio::test]
    async fn sparse_quote_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/approval"))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_only_body()))
            .expect(1)
            .mount(&server)
            .await;

        let quote = service_for(&server).get_quote(&params(1)).await.expect("quote");
        assert_eq!(quote.expected_output_amount, "0");
        assert_eq!(quote.expected_fill_time, 0);
        assert_eq!(quote.fees.total_fee_usd, "0");
        assert!(quote.approval_txns.is_empty());
        assert_eq!(quote.swap_tx.data, "0xabcdef");
    }

    #[tokio::test]
    async fn destination_is_pinned_for_every_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/approval"))
            .and(query_param("tradeType", TRADE_TYPE_MIN_OUTPUT))
            .and(query_param("destinationChainId", DESTINATION_CHAIN_ID.to_string()))
            .and(query_param("outputToken", DESTINATION_TOKEN))
            .and(query_param("appFee", APP_FEE))
            .and(query_param("appFeeRecipient", APP_FEE_RECIPIENT))
            .and(query_param("recipient", DEPOSITOR))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_only_body()))
            .expect(4)
            .mount(&server)
            .await;

        let service = service_for(&server);
        for origin in [1, 42161, 10, 8453] {
            let quote = service.get_quote(&params(origin)).await.expect("quote");
            assert_eq!(quote.origin_chain_id, origin);
            assert_eq!(quote.destination_chain_id, DESTINATION_CHAIN_ID);
        }
    }

    #[tokio::test]
    async fn error_statuses_map_to_kinds() {
        let cases = [
            (400, "{\"message\":\"amount too small\"}", ErrorKind::InvalidParams),
            (404, "no route", ErrorKind::RouteNotFound),
            (500, "{\"error\":\"boom\"}", ErrorKind::ServerUnavailable),
            (429, "", ErrorKind::NetworkConnection),
            (400, "{\"message\":\"Unsupported token\"}", ErrorKind::UnsupportedToken),
            (500, "{\"error\":{\"message\":\"Insufficient liquidity\"}}", ErrorKind::InsufficientLiquidity),
        ];
        for (status, body, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/swap/approval"))
                .respond_with(ResponseTemplate::new(status).set_body_string(body))
                .expect(1)
                .mount(&server)
                .await;
            let err = service_for(&server).get_quote(&params(1)).await.unwrap_err();
            assert_eq!(err.kind(), expected, "status {status} body {body}");
        }
    }

    #[tokio::test]
    async fn invalid_params_never_reach_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_only_body()))
            .expect(0)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let bad = [
            QuoteParams { amount: "0".to_string(), ..params(1) },
            QuoteParams { amount: "1.5".to_string(), ..params(1) },
            QuoteParams { depositor: "0x1234".to_string(), ..params(1) },
            QuoteParams { input_token: "usdc".to_string(), ..params(1) },
            QuoteParams { origin_chain_id: 0, ..params(1) },
        ];
        for case in bad {
            let err = service.get_quote(&case).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParams);
        }
    }

    #[tokio::test]
    async fn malformed_json_and_timeouts_are_network_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/approval"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let err = service_for(&server).get_quote(&params(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkConnection);

        let slow = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(swap_only_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&slow)
            .await;
        let config = BridgeConfig {
            api_base_url: slow.uri(),
            request_timeout_ms: 50,
            ..BridgeConfig::default()
        };
        let api = AcrossApiClient::new(reqwest::Client::new(), &config, &LoggingConfig::default());
        let err = AcrossService::new(api, &config)
            .get_quote(&params(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkConnection);
    }

    #[tokio::test]
    async fn actions_are_posted_with_handler_recipient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swap/approval"))
            .and(query_param("recipient", MULTICALL_HANDLER))
            .and(query_param("depositor", DEPOSITOR))
            .and(body_partial_json(json!({
                "actions": [{
                    "target": DESTINATION_TOKEN,
                    "functionSignature": "function approve(address spender, uint256 amount)",
                    "isNativeTransfer": false
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_only_body()))
            .expect(1)
            .mount(&server)
            .await;

        let actions = vec![Action::call(
            DESTINATION_TOKEN,
            "function approve(address spender, uint256 amount)",
            vec![
                ActionArg::Static(DEPOSITOR.to_string()),
                ActionArg::DynamicFromBalance(DESTINATION_TOKEN.to_string()),
            ],
        )];
        let quote = service_for(&server)
            .get_quote_with_actions(&params(42161), &actions)
            .await
            .expect("quote");
        assert_eq!(quote.origin_chain_id, 42161);
    }

    #[tokio::test]
    async fn empty_actions_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_only_body()))
            .expect(0)
            .mount(&server)
            .await;
        let err = service_for(&server)
            .get_quote_with_actions(&params(1), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }

    #[tokio::test]
    async fn chains_are_cached_per_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/chains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"chainId": 1, "name": "Ethereum", "logoURI": "https://x/eth.png"},
                {"chainId": 8453, "chainName": "Base"},
                {"name": "missing id"}
            ])))
            .expect(3)
            .mount(&server)
            .await;

        let service = service_for(&server);
        for _ in 0..3 {
            let chains = service.get_supported_chains().await.expect("chains");
            assert_eq!(chains.len(), 2);
        }
        service.clear_cache();
        service.get_supported_chains().await.expect("chains after clear");

        let other = service_for(&server);
        other.get_supported_chains().await.expect("first fetch");
        other.get_supported_chains().await.expect("cached");
        server.verify().await;
    }

    #[tokio::test]
    async fn tokens_cached_by_chain_and_all_tokens_uncached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/tokens"))
            .and(query_param("chainId", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tokens": [
                {"address": "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85", "chainId": 10, "symbol": "USDC", "decimals": 6},
                {"address": "0x4200000000000000000000000000000000000006", "chainId": "10", "symbol": "WETH", "name": "Wrapped Ether"},
                {"chainId": 10, "symbol": "BROKEN"}
            ]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/swap/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"address": USDC_MAINNET, "chainId": 1, "symbol": "USDC", "decimals": 6},
                {"address": DESTINATION_TOKEN, "chainId": 8453, "symbol": "USDC", "decimals": 6}
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let first = service.get_supported_tokens(10).await.expect("tokens");
        let second = service.get_supported_tokens(10).await.expect("cached tokens");
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].decimals, 6);
        assert_eq!(first[1].decimals, 18);

        assert_eq!(service.get_all_supported_tokens().await.expect("all").len(), 2);
        assert_eq!(service.get_all_supported_tokens().await.expect("all").len(), 2);
    }

    #[tokio::test]
    async fn expired_token_entries_are_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/tokens"))
            .and(query_param("chainId", "8453"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"address": DESTINATION_TOKEN, "chainId": 8453, "symbol": "USDC", "decimals": 6}
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let config = BridgeConfig {
            api_base_url: server.uri(),
            cache_ttl_secs: 0,
            ..BridgeConfig::default()
        };
        let api = AcrossApiClient::new(reqwest::Client::new(), &config, &LoggingConfig::default());
        let service = AcrossService::new(api, &config);
        for _ in 0..2 {
            let tokens = service.get_supported_tokens(8453).await.expect("tokens");
            assert_eq!(tokens[0].symbol, "USDC");
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn transient_resource_failures_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/chains"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/swap/chains"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"chainId": 10, "name": "Optimism"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let chains = service_for(&server).get_supported_chains().await.expect("chains");
        assert_eq!(chains[0].name, "Optimism");
    }

    #[tokio::test]
    async fn quotes_and_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swap/approval"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/swap/chains"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let err = service.get_quote(&params(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        let err = service.get_supported_chains().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
    }

    #[tokio::test]
    async fn deposit_status_polls_until_filled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/deposit/status"))
            .and(query_param("depositId", "777"))
            .and(query_param("originChainId", "42161"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/deposit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Completed",
                "fillTx": "0xfill",
                "outputAmount": "999000"
            })))
            .mount(&server)
            .await;

        let service = service_for(&server);
        assert_eq!(
            service.get_deposit_status("777", 42161).await.expect("status"),
            DepositStatus::Pending
        );
        let status = service
            .wait_for_fill("777", 42161, Duration::from_millis(5), Duration::from_secs(5))
            .await
            .expect("filled");
        assert_eq!(
            status,
            DepositStatus::Filled {
                fill_tx_hash: Some("0xfill".to_string()),
                output_amount: "999000".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn execute_requires_wallet() {
        let server = MockServer::start().await;
        let quote = Quote::from_value(&swap_only_body(), 1, DESTINATION_CHAIN_ID);
        let err = service_for(&server).execute_swap(&quote).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }

    #[test]
    fn same_token_transfer_is_reexported() {
        assert!(is_same_token_transfer(
            8453,
            DESTINATION_TOKEN,
            8453,
            &DESTINATION_TOKEN.to_lowercase()
        ));
        assert!(!is_same_token_transfer(1, DESTINATION_TOKEN, 8453, DESTINATION_TOKEN));
    }
}
