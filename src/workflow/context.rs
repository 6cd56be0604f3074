//! 分析上下文
//!
//! 两条流水线共享的依赖：推理网关、节流器和进度通知。
//! 上下文只读，克隆开销只是几个 `Arc`。

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::clients::InferenceGateway;
use crate::error::AnalysisResult;
use crate::models::ImagePayload;
use crate::services::{parse_response, LogProgress, NoDelay, ProgressSink, Throttle};

#[derive(Clone)]
pub struct AnalysisCtx {
    gateway: Arc<dyn InferenceGateway>,
    throttle: Arc<dyn Throttle>,
    progress: Arc<dyn ProgressSink>,
}

impl AnalysisCtx {
    /// 创建上下文，默认不等待、进度写入日志
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            gateway,
            throttle: Arc::new(NoDelay),
            progress: Arc::new(LogProgress),
        }
    }

    pub fn with_throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    /// 调用模型并解析为 JSON
    pub async fn ask_json(&self, prompt: &str, images: &[ImagePayload]) -> AnalysisResult<Value> {
        debug!(
            "发送请求: 提示词 {} 字符, {} 张图片",
            prompt.len(),
            images.len()
        );
        let raw = self.gateway.invoke(prompt, images).await?;
        debug!("收到响应: {} 字符", raw.len());
        parse_response(&raw)
    }

    pub fn report(&self, stage: &str) {
        self.progress.report(stage);
    }

    pub async fn pace(&self) {
        self.throttle.pace().await;
    }
}

/// 试卷图片在前，答题卡图片在后
pub(crate) fn paper_and_answers(
    question_images: &[ImagePayload],
    answer_images: &[ImagePayload],
) -> Vec<ImagePayload> {
    question_images
        .iter()
        .chain(answer_images)
        .cloned()
        .collect()
}
