use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// 对外暴露的错误分类，键值稳定，供上层做多语言映射。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidParams,
    UnsupportedNetwork,
    UnsupportedToken,
    InsufficientLiquidity,
    SlippageTooHigh,
    RouteNotFound,
    ServerUnavailable,
    NetworkConnection,
    TransactionRejected,
    InsufficientFunds,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::InvalidParams,
        ErrorKind::UnsupportedNetwork,
        ErrorKind::UnsupportedToken,
        ErrorKind::InsufficientLiquidity,
        ErrorKind::SlippageTooHigh,
        ErrorKind::RouteNotFound,
        ErrorKind::ServerUnavailable,
        ErrorKind::NetworkConnection,
        ErrorKind::TransactionRejected,
        ErrorKind::InsufficientFunds,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ErrorKind::InvalidParams => "INVALID_PARAMS",
            ErrorKind::UnsupportedNetwork => "UNSUPPORTED_NETWORK",
            ErrorKind::UnsupportedToken => "UNSUPPORTED_TOKEN",
            ErrorKind::InsufficientLiquidity => "INSUFFICIENT_LIQUIDITY",
            ErrorKind::SlippageTooHigh => "SLIPPAGE_TOO_HIGH",
            ErrorKind::RouteNotFound => "ROUTE_NOT_FOUND",
            ErrorKind::ServerUnavailable => "SERVER_UNAVAILABLE",
            ErrorKind::NetworkConnection => "NETWORK_CONNECTION",
            ErrorKind::TransactionRejected => "TRANSACTION_REJECTED",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
        }
    }

    /// 仅网络抖动类错误值得自动重试。
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkConnection | ErrorKind::ServerUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct BridgeError {
    kind: ErrorKind,
    detail: String,
}

impl BridgeError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, detail)
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkConnection, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
