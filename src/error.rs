//! 错误类型
//!
//! 分析过程中的错误分为四类：
//! - `Inference`：推理服务调用失败（网络 / 服务端），不做自动重试
//! - `Parse`：去掉代码围栏后仍无法解析为 JSON
//! - `Contract`：JSON 合法，但结构不符合该阶段的约定
//! - `Input`：输入本身有问题（例如一道题都没识别出来）
//!
//! 硬失败会被包装成 [`StageError`]，携带失败的阶段名称。

use std::fmt;

use thiserror::Error;

/// 分析错误
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// 推理服务调用失败
    #[error("推理服务调用失败 (模型: {model}): {message}")]
    Inference { model: String, message: String },

    /// 响应无法解析为 JSON
    #[error("响应解析失败: {message} (原始响应: {raw})")]
    Parse { message: String, raw: String },

    /// 响应结构不符合约定
    #[error("响应结构不符合约定: {0}")]
    Contract(String),

    /// 输入错误
    #[error("输入错误: {0}")]
    Input(String),
}

impl AnalysisError {
    /// 创建推理服务调用错误
    pub fn inference(model: impl Into<String>, message: impl fmt::Display) -> Self {
        AnalysisError::Inference {
            model: model.into(),
            message: message.to_string(),
        }
    }

    /// 错误类别名称（用于日志和降级记录）
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Inference { .. } => "InferenceError",
            AnalysisError::Parse { .. } => "ParseError",
            AnalysisError::Contract(_) => "ContractError",
            AnalysisError::Input(_) => "InputError",
        }
    }
}

/// 流水线阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    IdentifyQuestions,
    ExtractConcepts,
    MapQuestionsToConcepts,
    EvaluateConceptPerformance { concept: String },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::IdentifyQuestions => write!(f, "identify_questions"),
            Stage::ExtractConcepts => write!(f, "extract_concepts"),
            Stage::MapQuestionsToConcepts => write!(f, "map_questions_to_concepts"),
            Stage::EvaluateConceptPerformance { concept } => {
                write!(f, "evaluate_concept_performance({})", concept)
            }
        }
    }
}

/// 阶段失败（硬失败，终止整个流程）
#[derive(Debug, Clone, Error)]
#[error("阶段 [{stage}] 失败: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: AnalysisError,
}

impl StageError {
    pub fn new(stage: Stage, source: AnalysisError) -> Self {
        Self { stage, source }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API 密钥
    #[error("未找到 API 密钥，请设置 GOOGLE_API_KEY 或 LLM_API_KEY 环境变量")]
    MissingApiKey,

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 推理客户端初始化失败
    #[error("推理客户端初始化失败: {0}")]
    ClientInit(String),
}

/// 分析结果类型别名
pub type AnalysisResult<T> = Result<T, AnalysisError>;
