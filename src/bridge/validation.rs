use super::error::{BridgeError, BridgeResult};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub const NATIVE_TOKEN_PLACEHOLDER: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// `0x` 开头、40 位十六进制。不校验 EIP-55 大小写。
pub fn is_valid_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|body| body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `0x` 开头且其后全部为十六进制字符（允许 `0x` 本身）。
pub fn is_hex_string(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|body| body.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub fn is_positive_integer_string(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b != b'0')
}

/// 十进制整数字符串转为最小单位数量，空串视为 0。
pub fn parse_base_units(field: &str, value: Option<&str>) -> BridgeResult<u128> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u128>().map_err(|err| {
        BridgeError::invalid_params(format!("{field} is not a decimal integer ({trimmed}): {err}"))
    })
}

/// 未给出 gas 时交由钱包估算。
pub fn parse_gas_limit(value: Option<&str>) -> BridgeResult<Option<u128>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_base_units("gas", Some(raw)).map(Some),
    }
}

pub fn is_native_token(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS) || address.eq_ignore_ascii_case(NATIVE_TOKEN_PLACEHOLDER)
}

/// 同链同币无需跨链报价，调用方可直接转账。
pub fn is_same_token_transfer(chain_a: u64, token_a: &str, chain_b: u64, token_b: &str) -> bool {
    if chain_a != chain_b {
        return false;
    }
    token_a.eq_ignore_ascii_case(token_b) || (is_native_token(token_a) && is_native_token(token_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn address_format() {
        assert!(is_valid_address(USDC));
        assert!(is_valid_address(ZERO_ADDRESS));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(!is_valid_address("0xZZb86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn hex_strings() {
        assert!(is_hex_string("0x"));
        assert!(is_hex_string("0x095ea7b3"));
        assert!(!is_hex_string("095ea7b3"));
        assert!(!is_hex_string("0xnothex"));
    }

    #[test]
    fn positive_integer_strings() {
        assert!(is_positive_integer_string("1"));
        assert!(is_positive_integer_string("1000000"));
        assert!(is_positive_integer_string("007"));
        assert!(!is_positive_integer_string("0"));
        assert!(!is_positive_integer_string("000"));
        assert!(!is_positive_integer_string("-5"));
        assert!(!is_positive_integer_string("1.5"));
        assert!(!is_positive_integer_string(""));
    }

    #[test]
    fn base_units_default_to_zero() {
        assert_eq!(parse_base_units("value", None).unwrap(), 0);
        assert_eq!(parse_base_units("value", Some("")).unwrap(), 0);
        assert_eq!(parse_base_units("value", Some("42")).unwrap(), 42);
        assert!(parse_base_units("value", Some("0x2a")).is_err());
        assert_eq!(parse_gas_limit(None).unwrap(), None);
        assert_eq!(parse_gas_limit(Some("21000")).unwrap(), Some(21_000));
    }

    #[test]
    fn same_token_is_case_insensitive_and_chain_scoped() {
        let lower = USDC.to_lowercase();
        assert!(is_same_token_transfer(1, USDC, 1, &lower));
        assert!(is_same_token_transfer(1, &lower, 1, USDC));
        for (a, b) in [(1, 10), (8453, 42161), (10, 1)] {
            assert!(!is_same_token_transfer(a, USDC, b, USDC));
        }
        assert!(!is_same_token_transfer(1, USDC, 1, ZERO_ADDRESS));
    }

    #[test]
    fn native_representations_are_equivalent() {
        let placeholder_lower = NATIVE_TOKEN_PLACEHOLDER.to_lowercase();
        assert!(is_same_token_transfer(1, ZERO_ADDRESS, 1, NATIVE_TOKEN_PLACEHOLDER));
        assert!(is_same_token_transfer(1, NATIVE_TOKEN_PLACEHOLDER, 1, ZERO_ADDRESS));
        assert!(is_same_token_transfer(1, ZERO_ADDRESS, 1, &placeholder_lower));
        assert!(!is_same_token_transfer(1, ZERO_ADDRESS, 10, NATIVE_TOKEN_PLACEHOLDER));
    }
}
