//! 分析器 - 编排层
//!
//! 管理一次运行的生命周期：初始化推理网关和运行日志，执行选定的流水线，
//! 输出统计信息。

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::build_gateway;
use crate::config::Config;
use crate::error::StageError;
use crate::models::ImagePayload;
use crate::orchestrator::report::AnalysisReport;
use crate::services::{FixedDelay, LogProgress};
use crate::utils::logging;
use crate::workflow::{AnalysisCtx, ConceptFlow, QuestionFlow};

/// 一次运行的输入文档（每组按页顺序排列）
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    pub question_paper: Vec<ImagePayload>,
    pub answer_sheet: Vec<ImagePayload>,
    /// 知识点清单，仅知识点级分析需要
    pub concept_sheet: Vec<ImagePayload>,
}

/// 分析器
pub struct Analyzer {
    config: Config,
    ctx: AnalysisCtx,
}

impl Analyzer {
    /// 按配置初始化：创建推理网关，调用间隔取配置值
    pub fn initialize(config: Config) -> Result<Self> {
        let gateway = build_gateway(&config).context("推理网关初始化失败")?;
        let ctx = AnalysisCtx::new(gateway)
            .with_throttle(Arc::new(FixedDelay(config.pacing_delay())))
            .with_progress(Arc::new(LogProgress));
        Ok(Self { config, ctx })
    }

    /// 使用自定义上下文（测试时注入脚本化网关）
    pub fn with_context(config: Config, ctx: AnalysisCtx) -> Self {
        Self { config, ctx }
    }

    /// 题目级分析
    pub async fn analyze_questions(&self, documents: &DocumentSet) -> Result<AnalysisReport> {
        self.start_run("题目级分析", documents)?;

        let flow = QuestionFlow::new(self.ctx.clone());
        let outcomes = flow
            .run(&documents.question_paper, &documents.answer_sheet)
            .await
            .map_err(|e| self.record_failure(e))?;

        let report = AnalysisReport::questions(self.ctx.model_name(), outcomes);
        self.finish_run(&report)?;
        Ok(report)
    }

    /// 知识点级分析
    pub async fn analyze_concepts(&self, documents: &DocumentSet) -> Result<AnalysisReport> {
        if documents.concept_sheet.is_empty() {
            anyhow::bail!("知识点级分析需要提供知识点清单图片");
        }
        self.start_run("知识点级分析", documents)?;

        let flow = ConceptFlow::new(self.ctx.clone());
        let concept_report = flow
            .run(
                &documents.concept_sheet,
                &documents.question_paper,
                &documents.answer_sheet,
            )
            .await
            .map_err(|e| self.record_failure(e))?;

        let report = AnalysisReport::concepts(self.ctx.model_name(), concept_report);
        self.finish_run(&report)?;
        Ok(report)
    }

    fn start_run(&self, pipeline: &str, documents: &DocumentSet) -> Result<()> {
        if documents.question_paper.is_empty() || documents.answer_sheet.is_empty() {
            anyhow::bail!("试卷和答题卡都至少需要一页图片");
        }

        logging::init_log_file(&self.config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", self.config.output_log_file))?;
        logging::log_startup(&self.config, pipeline);

        info!(
            "📄 试卷 {} 页，答题卡 {} 页，知识点清单 {} 页",
            documents.question_paper.len(),
            documents.answer_sheet.len(),
            documents.concept_sheet.len()
        );
        logging::append_log_line(
            &self.config.output_log_file,
            &format!("流程: {}  模型: {}", pipeline, self.ctx.model_name()),
        )?;
        Ok(())
    }

    /// 把终止原因写入运行日志，再交给调用方
    fn record_failure(&self, e: StageError) -> StageError {
        if let Err(log_err) =
            logging::append_log_line(&self.config.output_log_file, &format!("❌ {}", e))
        {
            warn!("写入日志文件失败: {}", log_err);
        }
        e
    }

    fn finish_run(&self, report: &AnalysisReport) -> Result<()> {
        let lines = report.stat_lines();
        for line in &lines {
            logging::append_log_line(&self.config.output_log_file, line)?;
        }
        logging::print_final_stats(&lines, &self.config.output_log_file);
        Ok(())
    }
}
