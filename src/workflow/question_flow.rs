//! 题目级流程
//!
//! 流程顺序：
//! 1. 识别试卷中的所有题号（失败即终止）
//! 2. 逐题分析（单题失败记录为占位结果，继续下一题）

use tracing::{error, info, warn};

use crate::error::{AnalysisError, AnalysisResult, Stage, StageError};
use crate::models::{ImagePayload, QuestionId, QuestionOutcome, QuestionRecord};
use crate::services::{normalizer, prompts};
use crate::workflow::context::{paper_and_answers, AnalysisCtx};

pub struct QuestionFlow {
    ctx: AnalysisCtx,
}

impl QuestionFlow {
    pub fn new(ctx: AnalysisCtx) -> Self {
        Self { ctx }
    }

    /// 识别题号
    ///
    /// 一道题都没有识别出来时返回 `Input` 错误。
    pub async fn identify_questions(
        &self,
        question_images: &[ImagePayload],
    ) -> AnalysisResult<Vec<QuestionId>> {
        let value = self
            .ctx
            .ask_json(&prompts::identify_questions(), question_images)
            .await?;
        let questions = normalizer::normalize_question_list(value)?;

        if questions.is_empty() {
            return Err(AnalysisError::Input(
                "试卷中没有识别出任何题目".to_string(),
            ));
        }
        Ok(questions)
    }

    /// 分析单题
    ///
    /// 不返回错误：任何失败都转换为 [`QuestionOutcome::Degraded`]。
    pub async fn analyze_single_question(
        &self,
        question_images: &[ImagePayload],
        answer_images: &[ImagePayload],
        question: &QuestionId,
    ) -> QuestionOutcome {
        match self
            .try_analyze(question_images, answer_images, question)
            .await
        {
            Ok(record) => QuestionOutcome::Analyzed(record),
            Err(e) => {
                warn!("⚠️ 题目 {} 分析失败 ({}): {}", question, e.kind(), e);
                QuestionOutcome::Degraded(QuestionRecord::placeholder(question, &e.to_string()))
            }
        }
    }

    async fn try_analyze(
        &self,
        question_images: &[ImagePayload],
        answer_images: &[ImagePayload],
        question: &QuestionId,
    ) -> AnalysisResult<QuestionRecord> {
        let images = paper_and_answers(question_images, answer_images);
        let value = self
            .ctx
            .ask_json(&prompts::analyze_single_question(question), &images)
            .await?;
        normalizer::normalize_question_analysis(value, question)
    }

    /// 执行完整流程，按模型给出的题号顺序返回结果
    pub async fn run(
        &self,
        question_images: &[ImagePayload],
        answer_images: &[ImagePayload],
    ) -> Result<Vec<QuestionOutcome>, StageError> {
        self.ctx
            .report("Identifying questions in the question paper...");
        let questions = self
            .identify_questions(question_images)
            .await
            .map_err(|e| {
                error!("❌ 题号识别失败: {}", e);
                StageError::new(Stage::IdentifyQuestions, e)
            })?;

        let total = questions.len();
        info!("✓ 识别到 {} 道题目", total);

        let mut outcomes = Vec::with_capacity(total);
        for (index, question) in questions.iter().enumerate() {
            self.ctx
                .report(&format!("Analyzing question {}/{}", index + 1, total));

            let outcome = self
                .analyze_single_question(question_images, answer_images, question)
                .await;
            if !outcome.is_degraded() {
                info!(
                    "✓ 题目 {} 分析完成{}",
                    question,
                    if outcome.record().has_mistake { " (有错误)" } else { "" }
                );
            }
            outcomes.push(outcome);

            self.ctx.pace().await;
        }

        self.ctx.report("Analysis complete!");
        Ok(outcomes)
    }
}
