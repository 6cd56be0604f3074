//! 响应解析
//!
//! 模型被要求只返回一个 JSON 值，但经常用 Markdown 代码围栏包一层。
//! 这里只做去围栏，不做更深的修复，避免凭空"补出"数据。

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::utils::truncate_text;

/// 错误信息中保留的原始响应长度
pub const RAW_SNIPPET_LEN: usize = 500;

/// 开头的代码围栏：可选的语言标记（其后换行可有可无），然后取到下一个围栏（或文本末尾）
fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```(?:[A-Za-z][A-Za-z0-9_+.\-]*)?[ \t]*\r?\n?(.*?)(?:```|\z)")
            .expect("代码围栏正则无效")
    })
}

/// 去掉包裹 JSON 的代码围栏
///
/// 只有以围栏开头的文本才会处理，否则原样返回去掉首尾空白的文本。
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    fence_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// 把模型原始响应解析为 JSON
pub fn parse_response(raw: &str) -> AnalysisResult<Value> {
    let payload = strip_code_fence(raw);
    debug!("解析响应，长度: {} 字符", payload.len());

    serde_json::from_str(payload).map_err(|e| AnalysisError::Parse {
        message: e.to_string(),
        raw: truncate_text(raw.trim(), RAW_SNIPPET_LEN),
    })
}
