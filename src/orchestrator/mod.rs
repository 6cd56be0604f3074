//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的调度和输出，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `analyzer` - 分析器
//! - 管理运行生命周期（初始化网关、运行日志、统计输出）
//! - 按选定的流水线调度 workflow
//!
//! ### `report` - 分析报告
//! - 汇总记录、摘要文本和统计信息
//! - 序列化为稳定的 JSON 输出
//!
//! ## 层次关系
//!
//! ```text
//! analyzer (一次运行)
//!     ↓
//! workflow::QuestionFlow / ConceptFlow (一条流水线)
//!     ↓
//! services (能力层：prompts / parser / normalizer / projector)
//!     ↓
//! clients (推理网关)
//! ```

pub mod analyzer;
pub mod report;

// 重新导出主要类型
pub use analyzer::{Analyzer, DocumentSet};
pub use report::{AnalysisReport, ReportBody};
