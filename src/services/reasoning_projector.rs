//! 推理轨迹投影
//!
//! 映射阶段的推理是按题组织的，这里把它按知识点筛选出来，
//! 挂到对应的 [`crate::models::ConceptRecord`] 上。

use crate::models::{ConceptAlignment, ConfidenceLevel, ProjectedReasoning, ReasoningEntry};

/// 筛选出与某个知识点相关的推理
///
/// 只保留指向该知识点的对应关系；一条都没有的题目整体排除。保持输入顺序。
pub fn project(question_reasoning: &[ReasoningEntry], concept: &str) -> Vec<ProjectedReasoning> {
    question_reasoning
        .iter()
        .filter_map(|entry| {
            let alignments: Vec<ConceptAlignment> = entry
                .concept_alignments
                .iter()
                .filter(|a| a.concept == concept)
                .cloned()
                .collect();
            if alignments.is_empty() {
                return None;
            }

            Some(ProjectedReasoning {
                question: entry.question.clone(),
                summary: entry.summary.clone(),
                confidence: aggregate_confidence(&alignments),
                alignments,
                rejected_concepts: entry
                    .considered_but_rejected
                    .iter()
                    .map(|r| r.concept.clone())
                    .filter(|c| !c.is_empty())
                    .collect(),
            })
        })
        .collect()
}

/// 取最高置信度，缺失的按 medium 计
pub fn aggregate_confidence(alignments: &[ConceptAlignment]) -> ConfidenceLevel {
    alignments
        .iter()
        .map(|a| a.confidence.unwrap_or_default())
        .max()
        .unwrap_or_default()
}
