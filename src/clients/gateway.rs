//! 推理网关
//!
//! 把"一段提示词 + 一组图片"发送给外部多模态模型，返回原始文本。
//! 网关不做重试；生成参数和模型在构造时确定，之后只读。

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AnalysisResult;
use crate::models::ImagePayload;

/// 生成参数
///
/// 偏向确定性输出而不是创造性。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// 推理网关
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// 发送一次推理请求，返回模型的原始文本
    async fn invoke(&self, prompt: &str, images: &[ImagePayload]) -> AnalysisResult<String>;

    /// 当前使用的模型标识
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_wire_names() {
        let value = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(value["topK"], 40);
        assert_eq!(value["maxOutputTokens"], 8192);
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!((value["topP"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }
}
