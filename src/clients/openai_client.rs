//! OpenAI 兼容客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点（Gemini 的 OpenAI 兼容端点、各类代理网关）
//! - 图片以 `data:` URL 形式随用户消息发送
//!
//! OpenAI 接口没有 `top_k` 参数，该项在此接入方式下不生效。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::gateway::{GenerationConfig, InferenceGateway};
use crate::config::Config;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::ImagePayload;

pub const DEFAULT_OPENAI_COMPAT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// OpenAI 兼容客户端
pub struct OpenAiCompatClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    generation: GenerationConfig,
}

impl OpenAiCompatClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let api_base = config
            .llm_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_COMPAT_BASE_URL.to_string());
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(api_base);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.model.model_id().to_string(),
            generation: GenerationConfig::default(),
        }
    }

    /// 构建请求：文本在前，图片按顺序追加
    fn build_request(
        &self,
        prompt: &str,
        images: &[ImagePayload],
    ) -> AnalysisResult<CreateChatCompletionRequest> {
        let user_msg = if images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(images.len() + 1);

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ));

            for image in images {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                            detail: Some(ImageDetail::High),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()
        };
        let user_msg = user_msg.map_err(|e| AnalysisError::inference(&self.model_name, e))?;

        debug!(
            "top_k={} 在 OpenAI 兼容接口下不生效",
            self.generation.top_k
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(self.generation.temperature)
            .top_p(self.generation.top_p)
            .max_tokens(self.generation.max_output_tokens)
            .build()
            .map_err(|e| AnalysisError::inference(&self.model_name, e))
    }
}

#[async_trait]
impl InferenceGateway for OpenAiCompatClient {
    async fn invoke(&self, prompt: &str, images: &[ImagePayload]) -> AnalysisResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", prompt.len());
        if !images.is_empty() {
            debug!("使用 Vision API，包含 {} 张图片", images.len());
        }

        let request = self.build_request(prompt, images)?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AnalysisError::inference(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AnalysisError::inference(&self.model_name, "LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的客户端
    fn create_test_client() -> OpenAiCompatClient {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_api_base_url: Some("http://localhost:9/v1".to_string()),
            ..Default::default()
        };
        OpenAiCompatClient::new(&config)
    }

    #[test]
    fn test_request_carries_generation_config() {
        let client = create_test_client();
        let images = vec![ImagePayload::new(vec![0u8; 4], "image/jpeg")];
        let request = client.build_request("Extract concepts", &images).unwrap();

        assert_eq!(request.model, "gemini-2.5-pro");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.top_p, Some(0.8));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_request_without_images() {
        let client = create_test_client();
        assert!(client.build_request("List the questions", &[]).is_ok());
    }

    /// 需要真实的 API 密钥，手动运行：
    /// ```bash
    /// GOOGLE_API_KEY=... cargo test test_openai_compat_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_openai_compat_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut config = Config::from_env().expect("配置加载失败");
        config.model = crate::config::ModelTier::Flash;
        let client = OpenAiCompatClient::new(&config);

        let response = client
            .invoke("Return ONLY the JSON array [1, 2, 3].", &[])
            .await
            .expect("LLM 调用失败");

        println!("LLM 响应: {}", response);
        assert!(!response.is_empty());
    }
}
