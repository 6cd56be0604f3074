//! 调用节流
//!
//! 每次逐项推理调用之后等待一段固定时间，避免触发服务端限流。

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Throttle: Send + Sync {
    /// 在下一次调用之前等待
    async fn pace(&self);
}

/// 固定延迟
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn pace(&self) {
        debug!("⏳ 等待 {} ms", self.0.as_millis());
        tokio::time::sleep(self.0).await;
    }
}

/// 不等待（测试用）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pace(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fixed_delay_waits() {
        let throttle = FixedDelay(Duration::from_millis(30));
        let start = Instant::now();
        throttle.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_no_delay_returns_immediately() {
        let start = Instant::now();
        NoDelay.pace().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
