use std::borrow::Cow;

use crate::bridge::DESTINATION_TOKEN;
use crate::bridge::validation::is_native_token;

/// 日志里缩写 EVM 地址，常见代币直接显示符号。
pub fn short_address(address: &str) -> Cow<'_, str> {
    if is_native_token(address) {
        return Cow::Borrowed("NATIVE");
    }
    if address.eq_ignore_ascii_case(DESTINATION_TOKEN) {
        return Cow::Borrowed("USDC");
    }
    if address.len() <= 12 || !address.is_ascii() {
        return Cow::Borrowed(address);
    }
    Cow::Owned(format!("{}..{}", &address[..6], &address[address.len() - 4..]))
}
