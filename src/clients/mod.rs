pub mod gateway;
pub mod gemini_client;
pub mod mock;
pub mod openai_client;

pub use gateway::{GenerationConfig, InferenceGateway};
pub use gemini_client::GeminiClient;
pub use mock::{MockGateway, MockReply};
pub use openai_client::OpenAiCompatClient;

use std::sync::Arc;

use crate::config::{Backend, Config};
use crate::error::ConfigError;

/// 按配置创建推理网关
pub fn build_gateway(config: &Config) -> Result<Arc<dyn InferenceGateway>, ConfigError> {
    config.validate()?;
    match config.backend {
        Backend::Gemini => Ok(Arc::new(GeminiClient::new(config)?)),
        Backend::OpenaiCompat => Ok(Arc::new(OpenAiCompatClient::new(config))),
    }
}
