//! 进度通知
//!
//! 流水线在每个阶段 / 每一项开始前同步调用一次，参数是面向用户的阶段描述。

use tracing::info;

pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: &str);
}

/// 写入日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, stage: &str) {
        info!("📍 {}", stage);
    }
}

/// 忽略进度
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _stage: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, stage: &str) {
        self(stage)
    }
}
