use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{TransactionRequest, WalletError, WalletService};

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// 通过节点上已解锁的账户签名发送交易。
#[derive(Debug)]
pub struct RpcWallet {
    rpc_url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcWallet {
    pub fn new(client: reqwest::Client, rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            client,
            timeout: DEFAULT_RPC_TIMEOUT,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        debug!(target: "wallet::rpc", method, id = request.id, "发送 JSON-RPC 请求");

        let response: JsonRpcResponse = self
            .client
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            warn!(
                target: "wallet::rpc",
                method,
                code = error.code,
                message = %error.message,
                "JSON-RPC 返回错误"
            );
            return Err(WalletError::Provider(error.message));
        }
        response
            .result
            .ok_or_else(|| WalletError::Provider(format!("{method} returned no result")))
    }

    async fn require_account(&self) -> Result<String, WalletError> {
        self.get_account().await?.ok_or(WalletError::NotConnected)
    }
}

#[async_trait]
impl WalletService for RpcWallet {
    async fn send_transaction(&self, request: TransactionRequest) -> Result<String, WalletError> {
        let from = self.require_account().await?;
        let mut tx = json!({
            "from": from,
            "to": request.to,
            "data": request.data,
            "value": to_quantity(request.value),
        });
        if let Some(gas) = request.gas {
            tx["gas"] = Value::String(to_quantity(gas));
        }
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Provider(format!("unexpected tx hash: {result}")))
    }

    async fn get_account(&self) -> Result<Option<String>, WalletError> {
        let result = self.call("eth_accounts", json!([])).await?;
        Ok(result
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn get_balance(&self, account: Option<&str>) -> Result<u128, WalletError> {
        let owner = match account {
            Some(address) => address.to_string(),
            None => self.require_account().await?,
        };
        let result = self
            .call("eth_getBalance", json!([owner, "latest"]))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| WalletError::Provider(format!("unexpected balance: {result}")))?;
        from_quantity(raw)
            .ok_or_else(|| WalletError::Provider(format!("invalid balance quantity: {raw}")))
    }
}

fn to_quantity(value: u128) -> String {
    format!("{value:#x}")
}

fn from_quantity(raw: &str) -> Option<u128> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 16).ok()
}
