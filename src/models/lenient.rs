//! 宽松字段解析
//!
//! 模型输出的字段类型并不总是符合约定：文本字段可能是数字或 null，
//! 列表字段可能是 null 或单个字符串。这里的辅助函数把这些情况收敛到
//! 确定的默认值，真正的结构错误（例如对象的位置给了数组）仍然报错。

use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// 文本：字符串原样，数字/布尔转为字符串，null 视为空
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// 布尔值：接受 true/false、常见的真值字符串、非零数字
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(&value).unwrap_or_default())
}

/// null 按缺失处理
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// 备注列表：接受字符串数组、单个字符串或 null
pub(crate) fn lenient_notes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.trim().to_string()]),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(text_of)
            .filter(|s| !s.is_empty())
            .collect()),
        other => Err(D::Error::custom(format!(
            "evaluation_notes 应为字符串列表，实际为 {}",
            type_name(&other)
        ))),
    }
}

/// 文本映射：值宽松转换为字符串
pub(crate) fn lenient_text_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, text_of(&v).unwrap_or_default()))
        .collect())
}

/// JSON 值的类型名（用于错误信息）
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_vocabulary() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("Yes")));
        assert!(truthy(&json!("TRUE")));
        assert!(truthy(&json!(1)));
        assert!(!truthy(&json!("no")));
        assert!(!truthy(&json!("false")));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn test_text_of() {
        assert_eq!(text_of(&json!("  x ")), Some("x".to_string()));
        assert_eq!(text_of(&json!(42)), Some("42".to_string()));
        assert_eq!(text_of(&json!(null)), None);
    }
}
