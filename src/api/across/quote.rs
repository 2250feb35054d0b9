use serde::Serialize;
use serde_json::Value;

use crate::api::serde_helpers::{first_field, value_as_string, value_as_u64};

/// 调用方发起的报价参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteParams {
    pub origin_chain_id: u64,
    pub input_token: String,
    pub amount: String,
    pub depositor: String,
    pub recipient: String,
}

/// `/swap/approval` 查询参数，目标链与目标代币固定。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest<'a> {
    pub trade_type: &'static str,
    pub amount: &'a str,
    pub input_token: &'a str,
    pub output_token: &'a str,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
    pub depositor: &'a str,
    pub recipient: &'a str,
    pub app_fee: &'a str,
    pub app_fee_recipient: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub to: String,
    pub data: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
}

impl TransactionDescriptor {
    pub fn from_value(value: &Value) -> Self {
        Self {
            to: value_as_string(value.get("to")).unwrap_or_default(),
            data: value_as_string(value.get("data")).unwrap_or_default(),
            value: value_as_string(value.get("value")).unwrap_or_else(|| "0".to_string()),
            gas: value_as_string(first_field(value, &["gas", "gasLimit"])),
        }
    }

    pub fn has_target_and_data(&self) -> bool {
        !self.to.is_empty() && !self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub total_fee_usd: String,
    pub bridge_fee_usd: String,
    pub swap_fee_usd: String,
}

impl Default for FeeBreakdown {
    fn default() -> Self {
        Self {
            total_fee_usd: "0".to_string(),
            bridge_fee_usd: "0".to_string(),
            swap_fee_usd: "0".to_string(),
        }
    }
}

impl FeeBreakdown {
    fn from_value(fees: Option<&Value>) -> Self {
        let Some(fees) = fees else {
            return Self::default();
        };
        Self {
            total_fee_usd: fee_usd(fees, &["total", "totalFee"]),
            bridge_fee_usd: fee_usd(fees, &["bridge", "relayerTotal", "bridgeFee"]),
            swap_fee_usd: fee_usd(fees, &["swap", "originSwap", "swapFee"]),
        }
    }
}

/// 费用项既可能是 `{ "amountUsd": "1.2" }`，也可能直接是数值。
fn fee_usd(fees: &Value, keys: &[&str]) -> String {
    first_field(fees, keys)
        .and_then(|entry| {
            if entry.is_object() {
                value_as_string(first_field(entry, &["amountUsd", "usd"]))
            } else {
                value_as_string(Some(entry))
            }
        })
        .unwrap_or_else(|| "0".to_string())
}

/// 归一化后的报价，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub expected_output_amount: String,
    pub min_output_amount: String,
    pub input_amount: String,
    pub expected_fill_time: u64,
    pub fees: FeeBreakdown,
    pub swap_tx: TransactionDescriptor,
    pub approval_txns: Vec<TransactionDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_id: Option<String>,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
}

impl Quote {
    /// 上游字段缺失时一律回退到 `"0"` / 0 / 空列表，不返回错误。
    pub fn from_value(payload: &Value, origin_chain_id: u64, destination_chain_id: u64) -> Self {
        let amount = |keys: &[&str]| {
            value_as_string(first_field(payload, keys)).unwrap_or_else(|| "0".to_string())
        };
        let approval_txns = payload
            .get("approvalTxns")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(TransactionDescriptor::from_value).collect())
            .unwrap_or_default();
        let swap_tx = payload
            .get("swapTx")
            .map(TransactionDescriptor::from_value)
            .unwrap_or_default();

        Self {
            expected_output_amount: amount(&["expectedOutputAmount"]),
            min_output_amount: amount(&["minOutputAmount"]),
            input_amount: amount(&["inputAmount"]),
            expected_fill_time: value_as_u64(payload.get("expectedFillTime")).unwrap_or(0),
            fees: FeeBreakdown::from_value(payload.get("fees")),
            swap_tx,
            approval_txns,
            deposit_id: value_as_string(payload.get("depositId")),
            origin_chain_id,
            destination_chain_id,
        }
    }
}
