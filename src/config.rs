//! 程序配置
//!
//! 加载顺序：默认值 → TOML 配置文件（可选） → 环境变量 → 命令行参数。

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;

/// 两次推理调用之间的最小间隔
pub const MIN_PACING_DELAY: Duration = Duration::from_millis(500);

/// 模型档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    Pro,
    Flash,
    FlashExperimental,
}

impl ModelTier {
    /// 对应的模型标识
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTier::Pro => "gemini-2.5-pro",
            ModelTier::Flash => "gemini-2.5-flash",
            ModelTier::FlashExperimental => "gemini-2.0-flash-exp",
        }
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        ModelTier::Pro
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" | "gemini-2.5-pro" => Ok(ModelTier::Pro),
            "flash" | "gemini-2.5-flash" => Ok(ModelTier::Flash),
            "flash-experimental" | "flash-exp" | "gemini-2.0-flash-exp" => {
                Ok(ModelTier::FlashExperimental)
            }
            other => Err(format!(
                "未知的模型档位: {} (可选: pro, flash, flash-experimental)",
                other
            )),
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_id())
    }
}

/// 推理服务接入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Gemini 原生 REST 接口
    Gemini,
    /// OpenAI 兼容接口
    OpenaiCompat,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Gemini
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "openai_compat" | "openai-compat" | "openai" => Ok(Backend::OpenaiCompat),
            other => Err(format!("未知的接入方式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 推理服务接入方式
    pub backend: Backend,
    /// 模型档位
    pub model: ModelTier,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    /// 为空时使用接入方式的默认地址
    pub llm_api_base_url: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 两次推理调用之间的间隔（毫秒）
    pub pacing_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: ModelTier::default(),
            llm_api_key: String::new(),
            llm_api_base_url: None,
            request_timeout_secs: 300,
            pacing_delay_ms: 500,
            verbose_logging: false,
            output_log_file: "analysis_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 只从环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 从配置文件（可选）和环境变量加载
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(key) = env_string("GOOGLE_API_KEY").or_else(|| env_string("LLM_API_KEY")) {
            self.llm_api_key = key;
        }
        if let Some(url) = env_string("LLM_API_BASE_URL") {
            self.llm_api_base_url = Some(url);
        }
        if let Some(backend) = env_parsed::<Backend>("LLM_BACKEND", "backend")? {
            self.backend = backend;
        }
        if let Some(model) = env_parsed::<ModelTier>("LLM_MODEL_TIER", "model tier")? {
            self.model = model;
        }
        if let Some(ms) = env_parsed::<u64>("PACING_DELAY_MS", "u64")? {
            self.pacing_delay_ms = ms;
        }
        if let Some(secs) = env_parsed::<u64>("REQUEST_TIMEOUT_SECS", "u64")? {
            self.request_timeout_secs = secs;
        }
        if let Some(verbose) = env_parsed::<bool>("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = verbose;
        }
        if let Some(file) = env_string("OUTPUT_LOG_FILE") {
            self.output_log_file = file;
        }
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// 实际使用的调用间隔（不低于最小值）
    pub fn pacing_delay(&self) -> Duration {
        let requested = Duration::from_millis(self.pacing_delay_ms);
        if requested < MIN_PACING_DELAY {
            warn!(
                "调用间隔 {}ms 低于最小值，使用 {}ms",
                self.pacing_delay_ms,
                MIN_PACING_DELAY.as_millis()
            );
            return MIN_PACING_DELAY;
        }
        requested
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: FromStr>(name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
