//! 分析结果记录
//!
//! 题目级流程产出 [`QuestionOutcome`]，知识点级流程产出 [`ConceptRecord`]。
//! 这些结构即是交给报表渲染方的稳定输出格式。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::confidence::{lenient_confidence, ConfidenceLevel};
use super::lenient::{lenient_notes, lenient_text, lenient_text_map, null_as_default, text_of};
use super::question_id::QuestionId;

pub const QUESTION_TEXT_MISSING: &str = "Question text not extracted";
pub const SOLUTION_MISSING: &str = "Solution not available";
pub const STUDENT_ANSWER_MISSING: &str = "Student answer not extracted";
pub const MISTAKE_NOT_DESCRIBED: &str = "Mistake detected but not described";

fn missing_question() -> QuestionId {
    QuestionId::Unrecognized(Value::Null)
}

// ========== 题目级 ==========

/// 单题分析记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_number: QuestionId,
    pub question_text: String,
    /// 模型给出的参考解答
    #[serde(rename = "gemini_solution")]
    pub reference_solution: String,
    pub student_answer: String,
    pub has_mistake: bool,
    pub mistake_description: String,
}

impl QuestionRecord {
    /// 分析失败时的占位记录
    ///
    /// `has_mistake` 固定为 false，此时它不代表"答对了"。
    pub fn placeholder(question: &QuestionId, error: &str) -> Self {
        Self {
            question_number: question.clone(),
            question_text: format!("Question {} could not be analyzed", question),
            reference_solution: SOLUTION_MISSING.to_string(),
            student_answer: STUDENT_ANSWER_MISSING.to_string(),
            has_mistake: false,
            mistake_description: format!("Analysis failed: {}", error),
        }
    }
}

/// 单题分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionOutcome {
    /// 分析成功
    Analyzed(QuestionRecord),
    /// 分析失败，记录为占位内容
    Degraded(QuestionRecord),
}

impl QuestionOutcome {
    pub fn record(&self) -> &QuestionRecord {
        match self {
            QuestionOutcome::Analyzed(r) | QuestionOutcome::Degraded(r) => r,
        }
    }

    pub fn into_record(self) -> QuestionRecord {
        match self {
            QuestionOutcome::Analyzed(r) | QuestionOutcome::Degraded(r) => r,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, QuestionOutcome::Degraded(_))
    }
}

// ========== 推理轨迹 ==========

/// 题目与某个知识点的对应关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptAlignment {
    #[serde(default, deserialize_with = "lenient_text")]
    pub concept: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rationale: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<ConfidenceLevel>,
}

/// 考虑过但被排除的知识点
///
/// 模型偶尔只给出名称字符串，此时 `reason` 为空。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedConcept {
    pub concept: String,
    pub reason: String,
}

impl<'de> Deserialize<'de> for RejectedConcept {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let (concept, reason) = match &value {
            Value::Object(map) => (
                map.get("concept").and_then(text_of).unwrap_or_default(),
                map.get("reason").and_then(text_of).unwrap_or_default(),
            ),
            other => (text_of(other).unwrap_or_default(), String::new()),
        };
        Ok(Self { concept, reason })
    }
}

/// 单题的知识点归属推理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningEntry {
    #[serde(default = "missing_question")]
    pub question: QuestionId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concept_alignments: Vec<ConceptAlignment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub considered_but_rejected: Vec<RejectedConcept>,
}

/// 针对某个知识点筛选后的推理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedReasoning {
    pub question: QuestionId,
    pub summary: String,
    pub alignments: Vec<ConceptAlignment>,
    /// 匹配的对应关系中的最高置信度
    pub confidence: ConfidenceLevel,
    pub rejected_concepts: Vec<String>,
}

/// 单题在某个知识点上的表现推理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReasoningEntry {
    #[serde(default = "missing_question")]
    pub question: QuestionId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub observation: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub concept_evaluation: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub conclusion: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<ConfidenceLevel>,
}

// ========== 知识点级 ==========

/// 题目-知识点映射（第二阶段输出）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptMapping {
    #[serde(default, deserialize_with = "null_as_default")]
    pub concept_map: BTreeMap<String, Vec<QuestionId>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_reasoning: Vec<ReasoningEntry>,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub evaluation_notes: Vec<String>,
}

impl ConceptMapping {
    /// 某个知识点对应的题号（未出现时为空）
    pub fn questions_for(&self, concept: &str) -> &[QuestionId] {
        self.concept_map
            .get(concept)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// 单个知识点的表现评估（第三阶段输出）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptEvaluation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mistakes: Vec<QuestionId>,
    #[serde(default, deserialize_with = "lenient_text_map")]
    pub details: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: Vec<PerformanceReasoningEntry>,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub evaluation_notes: Vec<String>,
}

/// 知识点分析记录
///
/// 只能通过 [`ConceptRecord::untested`] 或 [`ConceptRecord::evaluated`] 构造。
/// 题号列表、计数和错误详情只读，计数始终等于对应列表的长度。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptRecord {
    pub concept: String,
    question_numbers: Vec<QuestionId>,
    tested_count: usize,
    mistakes_count: usize,
    mistake_questions: Vec<QuestionId>,
    details: BTreeMap<String, String>,
    pub concept_reasoning: Vec<ProjectedReasoning>,
    pub performance_reasoning: Vec<PerformanceReasoningEntry>,
    pub performance_notes: Vec<String>,
}

impl ConceptRecord {
    /// 本卷未考查的知识点
    pub fn untested(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            question_numbers: Vec::new(),
            tested_count: 0,
            mistakes_count: 0,
            mistake_questions: Vec::new(),
            details: BTreeMap::new(),
            concept_reasoning: Vec::new(),
            performance_reasoning: Vec::new(),
            performance_notes: Vec::new(),
        }
    }

    /// 已评估的知识点
    pub fn evaluated(
        concept: impl Into<String>,
        question_numbers: Vec<QuestionId>,
        evaluation: ConceptEvaluation,
    ) -> Self {
        Self {
            concept: concept.into(),
            tested_count: question_numbers.len(),
            question_numbers,
            mistakes_count: evaluation.mistakes.len(),
            mistake_questions: evaluation.mistakes,
            details: evaluation.details,
            concept_reasoning: Vec::new(),
            performance_reasoning: evaluation.reasoning,
            performance_notes: evaluation.evaluation_notes,
        }
    }

    pub fn with_concept_reasoning(mut self, reasoning: Vec<ProjectedReasoning>) -> Self {
        self.concept_reasoning = reasoning;
        self
    }

    /// 考查该知识点的题号
    pub fn question_numbers(&self) -> &[QuestionId] {
        &self.question_numbers
    }

    /// 出错的题号
    pub fn mistake_questions(&self) -> &[QuestionId] {
        &self.mistake_questions
    }

    /// 题号 → 错误说明，键都在 `mistake_questions` 中
    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    pub fn tested_count(&self) -> usize {
        self.tested_count
    }

    pub fn mistakes_count(&self) -> usize {
        self.mistakes_count
    }

    pub fn is_tested(&self) -> bool {
        self.tested_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let record = QuestionRecord::placeholder(&QuestionId::Number(2), "timeout");
        let value = serde_json::to_value(QuestionOutcome::Degraded(record)).unwrap();
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["question_number"], 2);
        assert_eq!(value["has_mistake"], false);
        assert!(value["gemini_solution"].is_string());
    }

    #[test]
    fn test_reasoning_entry_defaults() {
        let entry: ReasoningEntry = serde_json::from_value(json!({
            "question": "4",
            "concept_alignments": null,
            "considered_but_rejected": ["Limits", {"concept": "Series", "reason": "no sum"}]
        }))
        .unwrap();
        assert_eq!(entry.question, QuestionId::Number(4));
        assert_eq!(entry.summary, "");
        assert!(entry.concept_alignments.is_empty());
        assert_eq!(entry.considered_but_rejected[0].concept, "Limits");
        assert_eq!(entry.considered_but_rejected[1].reason, "no sum");
    }

    #[test]
    fn test_evaluated_counts_follow_lists() {
        let evaluation = ConceptEvaluation {
            mistakes: vec![QuestionId::Number(2)],
            ..Default::default()
        };
        let record = ConceptRecord::evaluated(
            "Chain Rule",
            vec![QuestionId::Number(1), QuestionId::Number(2)],
            evaluation,
        );
        assert_eq!(record.tested_count(), 2);
        assert_eq!(record.mistakes_count(), 1);

        let untested = ConceptRecord::untested("Limits");
        assert_eq!(untested.tested_count(), 0);
        assert_eq!(untested.mistakes_count(), 0);
        assert!(!untested.is_tested());
    }

    #[test]
    fn test_serialized_counts_match_lists() {
        let evaluation = ConceptEvaluation {
            mistakes: vec![QuestionId::Number(3)],
            details: BTreeMap::from([("3".to_string(), "Sign error".to_string())]),
            ..Default::default()
        };
        let record = ConceptRecord::evaluated(
            "Limits",
            vec![QuestionId::Number(1), QuestionId::Number(3), QuestionId::Number(5)],
            evaluation,
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tested_count"], 3);
        assert_eq!(value["question_numbers"].as_array().unwrap().len(), 3);
        assert_eq!(value["mistakes_count"], 1);
        assert_eq!(value["mistake_questions"], json!([3]));
        assert_eq!(value["details"]["3"], "Sign error");
    }
}
