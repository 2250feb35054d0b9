//! 跨链到账后在目标链上由 multicall handler 原子执行的附加动作。
//!
//! 捐赠场景固定为三步：授权 → 代受益人存入 → 凭签名执行订阅。

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// 动作参数：静态值，或到账后由桥按指定代币余额动态填充。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionArg {
    Static(String),
    DynamicFromBalance(String),
}

impl Serialize for ActionArg {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ActionArg::Static(value) => {
                let mut state = serializer.serialize_struct("ActionArg", 2)?;
                state.serialize_field("value", value)?;
                state.serialize_field("populateDynamically", &false)?;
                state.end()
            }
            ActionArg::DynamicFromBalance(token) => {
                let mut state = serializer.serialize_struct("ActionArg", 3)?;
                state.serialize_field("value", "0")?;
                state.serialize_field("populateDynamically", &true)?;
                state.serialize_field("balanceSourceToken", token)?;
                state.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub target: String,
    pub function_signature: String,
    pub args: Vec<ActionArg>,
    pub value: String,
    pub is_native_transfer: bool,
}

impl Action {
    pub fn call(target: impl Into<String>, signature: impl Into<String>, args: Vec<ActionArg>) -> Self {
        Self {
            target: target.into(),
            function_signature: signature.into(),
            args,
            value: "0".to_string(),
            is_native_transfer: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionsBody<'a> {
    pub actions: &'a [Action],
}

pub const APPROVE_SIGNATURE: &str = "function approve(address spender, uint256 amount)";
pub const DEPOSIT_FOR_SIGNATURE: &str = "function depositFor(address beneficiary, uint256 amount)";
pub const EXECUTE_BY_SIG_SIGNATURE: &str = "function executeBySig(address subscriber, address recipient, address token, uint256 amount, uint256 period, uint256 nonce, uint256 deadline, bytes signature)";

/// 订阅签名数据，由外部签名流程生成，这里只做透传。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSignature {
    pub subscriber: String,
    pub recipient: String,
    pub amount: String,
    pub period_seconds: u64,
    pub nonce: String,
    pub deadline: u64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationActionParams {
    /// 目标链上的结算代币（USDC）
    pub settlement_token: String,
    pub vault: String,
    pub subscription_manager: String,
    pub beneficiary: String,
    pub subscription: SubscriptionSignature,
}

pub fn build_donation_actions(params: &DonationActionParams) -> Vec<Action> {
    let balance = || ActionArg::DynamicFromBalance(params.settlement_token.clone());
    let sub = &params.subscription;
    vec![
        Action::call(
            &params.settlement_token,
            APPROVE_SIGNATURE,
            vec![ActionArg::Static(params.vault.clone()), balance()],
        ),
        Action::call(
            &params.vault,
            DEPOSIT_FOR_SIGNATURE,
            vec![ActionArg::Static(params.beneficiary.clone()), balance()],
        ),
        Action::call(
            &params.subscription_manager,
            EXECUTE_BY_SIG_SIGNATURE,
            vec![
                ActionArg::Static(sub.subscriber.clone()),
                ActionArg::Static(sub.recipient.clone()),
                ActionArg::Static(params.settlement_token.clone()),
                ActionArg::Static(sub.amount.clone()),
                ActionArg::Static(sub.period_seconds.to_string()),
                ActionArg::Static(sub.nonce.clone()),
                ActionArg::Static(sub.deadline.to_string()),
                ActionArg::Static(sub.signature.clone()),
            ],
        ),
    ]
}
