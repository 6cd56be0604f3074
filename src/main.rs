use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use performance_analyzer::config::{Backend, ModelTier};
use performance_analyzer::utils::logging;
use performance_analyzer::{Analyzer, Config, DocumentSet, ImagePayload};

/// 学生答卷分析工具
#[derive(Debug, Parser)]
#[command(name = "performance_analyzer", version, about)]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 模型档位: pro, flash, flash-experimental
    #[arg(long, global = true)]
    model: Option<ModelTier>,

    /// 推理服务接入方式: gemini, openai_compat
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// 结果输出文件（默认输出到 stdout）
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 逐题分析：识别题号后逐题比对学生作答
    Questions(PaperArgs),
    /// 知识点分析：按知识点统计考查和错误情况
    Concepts {
        #[command(flatten)]
        paper: PaperArgs,

        /// 知识点清单图片（按页顺序）
        #[arg(long = "concept-sheet", required = true, num_args = 1..)]
        concept_sheet: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct PaperArgs {
    /// 试卷图片（按页顺序）
    #[arg(long = "question-paper", required = true, num_args = 1..)]
    question_paper: Vec<PathBuf>,

    /// 答题卡图片（按页顺序）
    #[arg(long = "answer-sheet", required = true, num_args = 1..)]
    answer_sheet: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref()).context("配置加载失败")?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let analyzer = Analyzer::initialize(config)?;

    let report = match &cli.command {
        Command::Questions(paper) => {
            let documents = load_documents(paper, &[]).await?;
            analyzer.analyze_questions(&documents).await?
        }
        Command::Concepts {
            paper,
            concept_sheet,
        } => {
            let documents = load_documents(paper, concept_sheet).await?;
            analyzer.analyze_concepts(&documents).await?
        }
    };

    let json = report.to_json_pretty().context("报告序列化失败")?;
    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("无法写入结果文件: {}", path.display()))?;
            info!("💾 结果已保存至: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn load_documents(paper: &PaperArgs, concept_sheet: &[PathBuf]) -> Result<DocumentSet> {
    Ok(DocumentSet {
        question_paper: load_images(&paper.question_paper).await?,
        answer_sheet: load_images(&paper.answer_sheet).await?,
        concept_sheet: load_images(concept_sheet).await?,
    })
}

async fn load_images(paths: &[PathBuf]) -> Result<Vec<ImagePayload>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(load_image(path).await?);
    }
    Ok(images)
}

async fn load_image(path: &Path) -> Result<ImagePayload> {
    ImagePayload::from_path(path)
        .await
        .with_context(|| format!("无法加载图片: {}", path.display()))
}
