//! 上游接口字段类型并不稳定（数值时而是字符串、时而是数字），这里集中做宽松解析。

use serde_json::Value;

/// 数字或字符串统一转为字符串；`null`、对象、数组视为缺失。
pub fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// 非负整数字段，兼容 `12`、`"12"`、`12.0`。
pub fn value_as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// 依次尝试多个候选字段名，返回第一个存在的值。
pub fn first_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|candidate| !candidate.is_null())
}
