//! 报价落地：按顺序发送授权交易，再发送 swap 交易。
//!
//! 每笔交易只提交一次，不做重试；用户拒签立即终止后续所有提交。

use tracing::{Level, debug};

use crate::api::across::{Quote, TransactionDescriptor};
use crate::monitoring::events;
use crate::monitoring::measure_result;
use crate::wallet::{TransactionRequest, WalletService};

use super::classify::{classify_approval_failure, classify_swap_failure};
use super::error::{BridgeError, BridgeResult};
use super::validation::{is_hex_string, parse_base_units, parse_gas_limit};

pub async fn execute_swap(wallet: &dyn WalletService, quote: &Quote) -> BridgeResult<String> {
    if !quote.swap_tx.has_target_and_data() {
        return Err(BridgeError::invalid_params(
            "swap transaction is missing target or calldata",
        ));
    }

    let mut approvals_sent = 0usize;
    for (index, approval) in quote.approval_txns.iter().enumerate() {
        if let Some(reason) = invalid_reason(approval) {
            events::approval_skipped(index, &approval.to, reason);
            continue;
        }
        let request = match build_request(approval) {
            Ok(request) => request,
            Err(_) => {
                events::approval_skipped(index, &approval.to, "value or gas is not a decimal integer");
                continue;
            }
        };
        let tx_hash = measure_result("swap.approval", Level::DEBUG, wallet.send_transaction(request))
            .await
            .map_err(|err| {
                let message = err.to_string();
                let error = BridgeError::new(classify_approval_failure(&message), message);
                events::swap_failed("approval", &error);
                error
            })?;
        events::transaction_sent("approval", index, &tx_hash);
        approvals_sent += 1;
    }

    if let Some(reason) = invalid_reason(&quote.swap_tx) {
        return Err(BridgeError::invalid_params(format!(
            "swap transaction rejected before submission: {reason}"
        )));
    }
    let request = build_request(&quote.swap_tx)?;
    debug!(
        target: "bridge::executor",
        approvals_sent,
        value = request.value,
        gas = ?request.gas,
        "授权完成，提交 swap 交易"
    );
    let tx_hash = measure_result("swap.submit", Level::DEBUG, wallet.send_transaction(request))
        .await
        .map_err(|err| {
            let message = err.to_string();
            let error = BridgeError::new(classify_swap_failure(&message), message);
            events::swap_failed("swap", &error);
            error
        })?;
    events::transaction_sent("swap", approvals_sent, &tx_hash);
    events::swap_succeeded(&tx_hash, approvals_sent);
    Ok(tx_hash)
}

fn invalid_reason(tx: &TransactionDescriptor) -> Option<&'static str> {
    if tx.to.is_empty() {
        Some("missing target")
    } else if tx.data.is_empty() {
        Some("missing calldata")
    } else if !is_hex_string(&tx.to) {
        Some("target is not hex")
    } else if !is_hex_string(&tx.data) {
        Some("calldata is not hex")
    } else {
        None
    }
}

fn build_request(tx: &TransactionDescriptor) -> BridgeResult<TransactionRequest> {
    Ok(TransactionRequest {
        to: tx.to.clone(),
        data: tx.data.clone(),
        value: parse_base_units("value", Some(tx.value.as_str()))?,
        gas: parse_gas_limit(tx.gas.as_deref())?,
    })
}
