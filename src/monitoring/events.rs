use metrics::counter;
use tracing::{info, warn};

use crate::api::across::Quote;
use crate::bridge::error::{BridgeError, ErrorKind};

use super::format::short_address;
use super::metrics::prometheus_enabled;

pub fn quote_ready(quote: &Quote, with_actions: bool) {
    info!(
        target: "monitoring::quote",
        event = "quote_ready",
        origin_chain_id = quote.origin_chain_id,
        destination_chain_id = quote.destination_chain_id,
        input_amount = %quote.input_amount,
        expected_output = %quote.expected_output_amount,
        min_output = %quote.min_output_amount,
        total_fee_usd = %quote.fees.total_fee_usd,
        approvals = quote.approval_txns.len(),
        with_actions,
        "报价完成"
    );
    if prometheus_enabled() {
        counter!(
            "donate_bridge_quote_total",
            "outcome" => "success",
            "with_actions" => with_actions.to_string(),
        )
        .increment(1);
    }
}

pub fn quote_failed(origin_chain_id: u64, error: &BridgeError) {
    warn!(
        target: "monitoring::quote",
        event = "quote_failed",
        origin_chain_id,
        kind = error.kind().key(),
        detail = error.detail(),
        "报价失败"
    );
    if prometheus_enabled() {
        counter!(
            "donate_bridge_quote_total",
            "outcome" => error.kind().key(),
        )
        .increment(1);
    }
}

pub fn cache_lookup(resource: &'static str, hit: bool) {
    if prometheus_enabled() {
        counter!(
            "donate_bridge_cache_total",
            "resource" => resource,
            "outcome" => if hit { "hit" } else { "miss" },
        )
        .increment(1);
    }
}

pub fn approval_skipped(index: usize, target: &str, reason: &'static str) {
    warn!(
        target: "monitoring::swap",
        event = "approval_skipped",
        index,
        target_address = %short_address(target),
        reason,
        "授权交易数据无效，已跳过"
    );
}

pub fn transaction_sent(stage: &'static str, index: usize, tx_hash: &str) {
    info!(
        target: "monitoring::swap",
        event = "transaction_sent",
        stage,
        index,
        tx_hash,
        "交易已提交"
    );
    if prometheus_enabled() {
        counter!("donate_bridge_transactions_total", "stage" => stage).increment(1);
    }
}

/// 用户主动拒签属于正常分支，只记 info。
pub fn swap_failed(stage: &'static str, error: &BridgeError) {
    if error.kind() == ErrorKind::TransactionRejected {
        info!(
            target: "monitoring::swap",
            event = "swap_rejected",
            stage,
            "用户拒绝签名，流程终止"
        );
    } else {
        warn!(
            target: "monitoring::swap",
            event = "swap_failed",
            stage,
            kind = error.kind().key(),
            detail = error.detail(),
            "交易提交失败"
        );
    }
    if prometheus_enabled() {
        counter!(
            "donate_bridge_swap_total",
            "outcome" => error.kind().key(),
        )
        .increment(1);
    }
}

pub fn swap_succeeded(tx_hash: &str, approvals_sent: usize) {
    info!(
        target: "monitoring::swap",
        event = "swap_succeeded",
        tx_hash,
        approvals_sent,
        "兑换交易已提交"
    );
    if prometheus_enabled() {
        counter!("donate_bridge_swap_total", "outcome" => "success").increment(1);
    }
}
