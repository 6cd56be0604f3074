//! # Performance Analyzer
//!
//! 根据试卷、学生答题卡和知识点清单的图片，调用外部多模态模型，
//! 生成结构化的学习反馈。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 推理网关，只负责"发提示词和图片，拿回文本"
//! - `GeminiClient` - Gemini 原生 REST 接口
//! - `OpenAiCompatClient` - OpenAI 兼容接口
//! - `MockGateway` - 脚本化响应，用于测试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `prompts` - 各阶段提示词
//! - `response_parser` - 去代码围栏并解析 JSON
//! - `normalizer` - 把 JSON 规范化为类型化记录
//! - `reasoning_projector` - 按知识点筛选推理轨迹
//! - `throttle` / `progress` - 调用节流和进度通知
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一条流水线的完整处理流程
//! - `QuestionFlow` - 题号识别 → 逐题分析（单题失败不终止）
//! - `ConceptFlow` - 提取知识点 → 题目映射 → 逐个知识点评估（任一步失败即终止）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/analyzer` - 一次运行的生命周期、运行日志和统计
//! - `orchestrator/report` - 最终输出的 JSON 报告
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{build_gateway, InferenceGateway, MockGateway, MockReply};
pub use config::{Backend, Config, ModelTier};
pub use error::{AnalysisError, AnalysisResult, ConfigError, Stage, StageError};
pub use models::{ConceptRecord, ImagePayload, QuestionId, QuestionOutcome, QuestionRecord};
pub use orchestrator::{AnalysisReport, Analyzer, DocumentSet};
pub use workflow::{AnalysisCtx, ConceptFlow, ConceptReport, QuestionFlow};
