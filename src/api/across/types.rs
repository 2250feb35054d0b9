use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::serde_helpers::{first_field, value_as_string, value_as_u64};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub logo_url: Option<String>,
}

impl ChainInfo {
    /// 缺少 chainId 或名称的条目视为无效。
    pub fn from_value(value: &Value) -> Option<Self> {
        let chain_id = value_as_u64(value.get("chainId")).filter(|id| *id > 0)?;
        let name = first_field(value, &["name", "chainName"])
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())?
            .to_string();
        let logo_url = first_field(value, &["logoURI", "logoUrl"])
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            chain_id,
            name,
            logo_url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    pub chain_id: u64,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub logo_url: Option<String>,
}

impl TokenInfo {
    /// 缺少地址、chainId 或 symbol 的条目视为无效；name 缺失时回退为 symbol。
    pub fn from_value(value: &Value) -> Option<Self> {
        let address = value
            .get("address")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|address| !address.is_empty())?
            .to_string();
        let chain_id = value_as_u64(value.get("chainId")).filter(|id| *id > 0)?;
        let symbol = value
            .get("symbol")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())?
            .to_string();
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone());
        let decimals = value_as_u64(value.get("decimals"))
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(18);
        let logo_url = first_field(value, &["logoURI", "logoUrl"])
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            address,
            chain_id,
            symbol,
            name,
            decimals,
            logo_url,
        })
    }
}

/// 列表接口可能直接返回数组，也可能包一层 `{ "<key>": [...] }`。
pub(crate) fn list_items<'a>(payload: &'a Value, wrapper_key: &str) -> Option<&'a Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get(wrapper_key).and_then(Value::as_array),
        _ => None,
    }
}

pub(crate) fn parse_list<T>(
    items: &[Value],
    resource: &'static str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Vec<T> {
    let parsed: Vec<T> = items.iter().filter_map(parse).collect();
    let dropped = items.len() - parsed.len();
    if dropped > 0 {
        debug!(
            target: "across::types",
            resource,
            dropped,
            kept = parsed.len(),
            "过滤掉格式不完整的条目"
        );
    }
    parsed
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DepositStatus {
    Pending,
    Filled {
        fill_tx_hash: Option<String>,
        output_amount: String,
    },
    Expired,
}

impl DepositStatus {
    pub fn from_value(value: &Value) -> Self {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match status.as_str() {
            "filled" | "complete" | "completed" => DepositStatus::Filled {
                fill_tx_hash: first_field(value, &["fillTxHash", "fillTx"])
                    .and_then(Value::as_str)
                    .map(str::to_string),
                output_amount: value_as_string(value.get("outputAmount"))
                    .unwrap_or_else(|| "0".to_string()),
            },
            "expired" => DepositStatus::Expired,
            _ => DepositStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DepositStatus::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Filled { .. } => "filled",
            DepositStatus::Expired => "expired",
        }
    }
}
