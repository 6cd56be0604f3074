//! Gemini 客户端
//!
//! 直接调用 Gemini `generateContent` REST 接口，图片以 base64 内联，
//! 完整传递生成参数（包括 OpenAI 兼容接口无法表达的 `topK`）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::gateway::{GenerationConfig, InferenceGateway};
use crate::config::Config;
use crate::error::{AnalysisError, AnalysisResult, ConfigError};
use crate::models::ImagePayload;
use crate::utils::truncate_text;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini 客户端
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// 创建新的 Gemini 客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::ClientInit(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.llm_api_key.clone(),
            api_base_url: config
                .llm_api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            model_name: config.model.model_id().to_string(),
            generation: GenerationConfig::default(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model_name
        )
    }

    fn build_request<'a>(
        &self,
        prompt: &'a str,
        images: &[ImagePayload],
    ) -> GenerateContentRequest<'a> {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(Part::Text { text: prompt });
        for image in images {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.to_base64(),
                },
            });
        }

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: self.generation,
        }
    }
}

#[async_trait]
impl InferenceGateway for GeminiClient {
    async fn invoke(&self, prompt: &str, images: &[ImagePayload]) -> AnalysisResult<String> {
        debug!("调用 Gemini API，模型: {}", self.model_name);
        debug!(
            "提示词长度: {} 字符, 图片: {} 张",
            prompt.len(),
            images.len()
        );

        let request = self.build_request(prompt, images);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini API 调用失败: {}", e);
                AnalysisError::inference(&self.model_name, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::inference(&self.model_name, e))?;

        if !status.is_success() {
            warn!("Gemini API 返回错误状态: {}", status);
            return Err(AnalysisError::inference(
                &self.model_name,
                format!("HTTP {}: {}", status, truncate_text(&body, 300)),
            ));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::inference(&self.model_name, format!("无法识别的响应格式: {}", e))
        })?;

        let text = extract_text(parsed).map_err(|msg| AnalysisError::inference(&self.model_name, msg))?;

        debug!("Gemini API 调用成功，响应长度: {} 字符", text.len());

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// 拼接第一个候选结果中的全部文本片段
fn extract_text(response: GenerateContentResponse) -> Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("请求被拦截: {}", reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| "返回结果为空".to_string())?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(format!(
            "返回内容为空 (finishReason: {})",
            candidate.finish_reason.as_deref().unwrap_or("未知")
        ));
    }

    Ok(text.trim().to_string())
}

// ========== 请求 / 响应结构 ==========

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
