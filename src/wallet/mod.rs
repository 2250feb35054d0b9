//! 钱包协作方接口。本模块不管理连接生命周期，默认签名者已就绪。

pub mod rpc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use rpc::RpcWallet;

/// 待签名发送的 EVM 交易，金额与 gas 均为最小单位整数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub to: String,
    pub data: String,
    pub value: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<u128>,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,
    /// 钱包或节点返回的原始错误文本，供错误分类器识别拒签、余额不足等情形。
    #[error("{0}")]
    Provider(String),
    #[error("wallet transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait WalletService: Send + Sync {
    async fn send_transaction(&self, request: TransactionRequest) -> Result<String, WalletError>;

    async fn get_account(&self) -> Result<Option<String>, WalletError>;

    /// `account` 为空时查询当前账户余额。
    async fn get_balance(&self, account: Option<&str>) -> Result<u128, WalletError>;
}
