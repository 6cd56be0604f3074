//! 题号
//!
//! 模型返回的题号可能是整数，也可能是数字字符串。两者统一转换为整数；
//! 其他形态原样保留，交给下游作为数据质量信号处理，而不是静默丢弃。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// 题号
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionId {
    /// 可识别的整数题号
    Number(i64),
    /// 无法识别的原始值
    Unrecognized(Value),
}

impl QuestionId {
    /// 从任意 JSON 值转换
    pub fn from_value(value: Value) -> Self {
        match &value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => QuestionId::Number(i),
                None => QuestionId::Unrecognized(value),
            },
            Value::String(s) => match parse_digits(s) {
                Some(i) => QuestionId::Number(i),
                None => QuestionId::Unrecognized(value),
            },
            _ => QuestionId::Unrecognized(value),
        }
    }

    /// 从字符串转换（用于 `details` 的键）
    pub fn from_key(key: &str) -> Self {
        match parse_digits(key) {
            Some(i) => QuestionId::Number(i),
            None => QuestionId::Unrecognized(Value::String(key.to_string())),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            QuestionId::Number(i) => Some(*i),
            QuestionId::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, QuestionId::Number(_))
    }
}

/// 仅接受纯数字字符串（允许首尾空白）
fn parse_digits(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

impl From<i64> for QuestionId {
    fn from(value: i64) -> Self {
        QuestionId::Number(value)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(i) => write!(f, "{}", i),
            QuestionId::Unrecognized(Value::String(s)) => write!(f, "{}", s),
            QuestionId::Unrecognized(other) => write!(f, "{}", other),
        }
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(QuestionId::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_number_coerce_to_same_id() {
        assert_eq!(QuestionId::from_value(json!("3")), QuestionId::Number(3));
        assert_eq!(QuestionId::from_value(json!(3)), QuestionId::Number(3));
        assert_eq!(QuestionId::from_value(json!(" 3 ")), QuestionId::Number(3));
    }

    #[test]
    fn test_non_numeric_passes_through() {
        assert_eq!(
            QuestionId::from_value(json!("3a")),
            QuestionId::Unrecognized(json!("3a"))
        );
        assert_eq!(
            QuestionId::from_value(json!(2.5)),
            QuestionId::Unrecognized(json!(2.5))
        );
        assert_eq!(
            QuestionId::from_value(json!(null)),
            QuestionId::Unrecognized(Value::Null)
        );
    }

    #[test]
    fn test_serializes_like_the_input() {
        let ids: Vec<QuestionId> = serde_json::from_value(json!([1, "2", "Q3"])).unwrap();
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!([1, 2, "Q3"]));
        assert_eq!(ids[2].to_string(), "Q3");
    }
}
