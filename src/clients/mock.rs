//! 脚本化的推理网关
//!
//! 按顺序返回预先设定的响应，并记录每次调用，用于测试流水线。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::clients::gateway::InferenceGateway;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::ImagePayload;

/// 预设响应
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 返回文本
    Text(String),
    /// 模拟服务调用失败
    Failure(String),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(content.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        MockReply::Failure(message.into())
    }
}

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image_count: usize,
}

pub struct MockGateway {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    model_name: String,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            model_name: "mock-model".to_string(),
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let gateway = Self::new();
        gateway.add_replies(replies);
        gateway
    }

    pub fn add_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn add_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        let mut queue = self.replies.lock().unwrap();
        queue.extend(replies);
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceGateway for MockGateway {
    async fn invoke(&self, prompt: &str, images: &[ImagePayload]) -> AnalysisResult<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            image_count: images.len(),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(message)) => {
                Err(AnalysisError::inference(&self.model_name, message))
            }
            None => Err(AnalysisError::inference(
                &self.model_name,
                "没有可用的预设响应",
            )),
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_and_records_calls() {
        let gateway = MockGateway::with_replies([
            MockReply::text("[1]"),
            MockReply::failure("503 unavailable"),
        ]);
        let images = vec![ImagePayload::new(vec![1u8], "image/png")];

        assert_eq!(gateway.invoke("first", &images).await.unwrap(), "[1]");
        let err = gateway.invoke("second", &[]).await.unwrap_err();
        assert!(err.to_string().contains("503 unavailable"));
        assert!(gateway.invoke("third", &[]).await.is_err());

        let calls = gateway.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].image_count, 1);
        assert_eq!(calls[1].prompt, "second");
        assert_eq!(gateway.remaining_replies(), 0);
    }
}
