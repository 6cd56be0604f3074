//! 知识点级流程
//!
//! 流程顺序：
//! 1. 从知识点清单中提取知识点
//! 2. 建立题目与知识点的映射（附带逐题推理）
//! 3. 逐个知识点评估学生表现（未考查的知识点不发起调用）
//!
//! 任何一步失败都会终止整个流程，错误中携带失败的阶段。

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{AnalysisResult, Stage, StageError};
use crate::models::{ConceptEvaluation, ConceptMapping, ConceptRecord, ImagePayload, QuestionId};
use crate::services::{normalizer, prompts, reasoning_projector};
use crate::workflow::context::{paper_and_answers, AnalysisCtx};

/// 知识点级流程的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConceptReport {
    /// 按提取顺序排列
    pub records: Vec<ConceptRecord>,
    /// 映射阶段的整体备注
    pub mapping_notes: Vec<String>,
}

pub struct ConceptFlow {
    ctx: AnalysisCtx,
}

impl ConceptFlow {
    pub fn new(ctx: AnalysisCtx) -> Self {
        Self { ctx }
    }

    /// 提取知识点名称
    pub async fn extract_concepts(
        &self,
        concept_images: &[ImagePayload],
    ) -> AnalysisResult<Vec<String>> {
        let value = self
            .ctx
            .ask_json(&prompts::extract_concepts(), concept_images)
            .await?;
        normalizer::normalize_concept_list(value)
    }

    /// 建立题目-知识点映射
    pub async fn map_questions_to_concepts(
        &self,
        question_images: &[ImagePayload],
        concepts: &[String],
    ) -> AnalysisResult<ConceptMapping> {
        let value = self
            .ctx
            .ask_json(&prompts::map_questions_to_concepts(concepts), question_images)
            .await?;
        normalizer::normalize_concept_mapping(value, concepts)
    }

    /// 评估学生在单个知识点上的表现
    ///
    /// 题号列表为空时直接返回空评估，不调用模型。
    pub async fn evaluate_concept_performance(
        &self,
        question_images: &[ImagePayload],
        answer_images: &[ImagePayload],
        concept: &str,
        question_numbers: &[QuestionId],
    ) -> AnalysisResult<ConceptEvaluation> {
        if question_numbers.is_empty() {
            return Ok(ConceptEvaluation::default());
        }

        let images = paper_and_answers(question_images, answer_images);
        let value = self
            .ctx
            .ask_json(
                &prompts::evaluate_concept_performance(concept, question_numbers),
                &images,
            )
            .await?;
        normalizer::normalize_concept_evaluation(value, concept, question_numbers)
    }

    /// 执行完整流程
    pub async fn run(
        &self,
        concept_images: &[ImagePayload],
        question_images: &[ImagePayload],
        answer_images: &[ImagePayload],
    ) -> Result<ConceptReport, StageError> {
        // ========== 阶段 1: 提取知识点 ==========
        self.ctx.report("Extracting concepts from analysis sheet...");
        let concepts = self
            .extract_concepts(concept_images)
            .await
            .map_err(|e| abort(Stage::ExtractConcepts, e))?;

        if concepts.is_empty() {
            warn!("⚠️ 知识点清单中没有提取到任何知识点，跳过后续阶段");
            self.ctx.report("Analysis complete!");
            return Ok(ConceptReport::default());
        }
        info!("✓ 提取到 {} 个知识点", concepts.len());

        // ========== 阶段 2: 题目-知识点映射 ==========
        self.ctx.report(&format!(
            "Analyzing question paper for {} concepts...",
            concepts.len()
        ));
        let mapping = self
            .map_questions_to_concepts(question_images, &concepts)
            .await
            .map_err(|e| abort(Stage::MapQuestionsToConcepts, e))?;

        // ========== 阶段 3: 逐个知识点评估 ==========
        let total = concepts.len();
        let mut records = Vec::with_capacity(total);
        for (index, concept) in concepts.iter().enumerate() {
            self.ctx.report(&format!(
                "Analyzing concept {}/{}: {}",
                index + 1,
                total,
                concept
            ));

            let question_numbers = mapping.questions_for(concept).to_vec();
            let record = if question_numbers.is_empty() {
                info!("[{}] 本卷未考查", concept);
                ConceptRecord::untested(concept.as_str())
            } else {
                let evaluation = self
                    .evaluate_concept_performance(
                        question_images,
                        answer_images,
                        concept,
                        &question_numbers,
                    )
                    .await
                    .map_err(|e| {
                        abort(
                            Stage::EvaluateConceptPerformance {
                                concept: concept.clone(),
                            },
                            e,
                        )
                    })?;
                self.ctx.pace().await;

                let record = ConceptRecord::evaluated(concept.as_str(), question_numbers, evaluation);
                info!(
                    "✓ [{}] 考查 {} 次，错误 {} 次",
                    concept,
                    record.tested_count(),
                    record.mistakes_count()
                );
                record
            };

            let reasoning = reasoning_projector::project(&mapping.question_reasoning, concept);
            records.push(record.with_concept_reasoning(reasoning));
        }

        self.ctx.report("Analysis complete!");
        Ok(ConceptReport {
            records,
            mapping_notes: mapping.evaluation_notes,
        })
    }
}

fn abort(stage: Stage, source: crate::error::AnalysisError) -> StageError {
    error!("❌ 阶段 [{}] 失败: {}", stage, source);
    StageError::new(stage, source)
}
