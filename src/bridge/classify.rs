//! 错误归类：HTTP 状态码、接口报错文本与钱包报错文本统一映射到 [`ErrorKind`]。
//!
//! 所有函数均为纯函数，不做 IO，也不记录日志。

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use super::error::{BridgeError, ErrorKind};

static PATTERNS: Lazy<Vec<(Regex, ErrorKind)>> = Lazy::new(|| {
    [
        (
            r"\b(unsupported|invalid|unknown)\W+(\w+\W+)?\w*(chain|network)|\b\w*(chain|network)\w*\s+(is\s+)?not\s+supported",
            ErrorKind::UnsupportedNetwork,
        ),
        (
            r"\b(unsupported|invalid|unknown)\W+([\w/]+\W+)?\w*token|\b\w*token\w*\s+(is\s+)?not\s+supported",
            ErrorKind::UnsupportedToken,
        ),
        (
            r"\b(insufficient|low|no)\s+liquidity",
            ErrorKind::InsufficientLiquidity,
        ),
        (
            r"slippage\s+too\s+high|excessive\s+slippage|price\s+impact\s+too\s+high",
            ErrorKind::SlippageTooHigh,
        ),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("static pattern compiles"), kind))
    .collect()
});

const REJECTION_MARKERS: [&str; 4] = ["rejected", "denied", "cancelled", "canceled"];

const BALANCE_MARKERS: [&str; 4] = [
    "insufficient funds",
    "insufficient balance",
    "not enough balance",
    "exceeds balance",
];

/// 按顺序匹配已知报错文本，首个命中的分类生效。
pub fn detect_specific_error(message: &str) -> Option<ErrorKind> {
    let lowered = message.to_lowercase();
    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(&lowered))
        .map(|(_, kind)| *kind)
}

pub fn is_user_rejection(message: &str) -> bool {
    let lowered = message.to_lowercase();
    REJECTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

pub fn is_insufficient_balance(message: &str) -> bool {
    let lowered = message.to_lowercase();
    BALANCE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

pub fn classify_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        400 => ErrorKind::InvalidParams,
        404 => ErrorKind::RouteNotFound,
        code if code >= 500 => ErrorKind::ServerUnavailable,
        _ => ErrorKind::NetworkConnection,
    }
}

/// 非 2xx 响应归类：优先解析报文中的 message，未命中再按状态码兜底。
pub fn handle_api_error(status: StatusCode, body: &str) -> BridgeError {
    let message = extract_error_message(body);
    if let Some(kind) = message.as_deref().and_then(detect_specific_error) {
        return BridgeError::new(kind, message.unwrap_or_default());
    }
    let detail = match message {
        Some(text) => format!("status {}: {text}", status.as_u16()),
        None => format!("status {}", status.as_u16()),
    };
    BridgeError::new(classify_status(status), detail)
}

/// 发送授权交易失败时的归类。
pub fn classify_approval_failure(message: &str) -> ErrorKind {
    if is_user_rejection(message) {
        ErrorKind::TransactionRejected
    } else {
        ErrorKind::NetworkConnection
    }
}

/// 发送 swap 交易失败时的归类，余额不足统一归为 `InsufficientFunds`。
pub fn classify_swap_failure(message: &str) -> ErrorKind {
    if is_user_rejection(message) {
        return ErrorKind::TransactionRejected;
    }
    if let Some(kind) = detect_specific_error(message) {
        return kind;
    }
    if is_insufficient_balance(message) {
        return ErrorKind::InsufficientFunds;
    }
    ErrorKind::NetworkConnection
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.get("message"),
        value.get("error").and_then(|err| err.get("message")),
        value.get("error"),
        value.get("detail"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| candidate.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
