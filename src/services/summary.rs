//! 报告摘要与运行统计
//!
//! 摘要文本给报表渲染方直接使用，统计信息写入运行日志。

use serde::Serialize;

use crate::models::{ConceptRecord, QuestionId, QuestionOutcome};

pub const NOT_TESTED: &str = "Not tested in this paper";
pub const NO_MISTAKE_DETAILS: &str = "No detailed analysis needed (no mistakes)";
pub const ERROR_NOT_SPECIFIED: &str = "Error not specified";

/// 单个知识点的一行摘要
pub fn performance_summary(record: &ConceptRecord) -> String {
    if record.tested_count() == 0 {
        return NOT_TESTED.to_string();
    }
    if record.mistakes_count() == 0 {
        return format!("Tested {} times - No mistakes", record.tested_count());
    }
    format!(
        "Tested {} times - Mistakes {} times (Q.No {})",
        record.tested_count(),
        record.mistakes_count(),
        join_ids(record.mistake_questions())
    )
}

/// 错题明细，按题号排序，每题一行
pub fn mistake_details(record: &ConceptRecord) -> String {
    if record.mistake_questions().is_empty() {
        return NO_MISTAKE_DETAILS.to_string();
    }

    let mut questions: Vec<&QuestionId> = record.mistake_questions().iter().collect();
    // 可识别的题号按数值排序，无法识别的排在后面并保持原顺序
    questions.sort_by_key(|q| q.as_number().map_or((1, 0), |n| (0, n)));

    questions
        .into_iter()
        .map(|q| {
            let key = q.to_string();
            let detail = record
                .details()
                .get(&key)
                .map(String::as_str)
                .unwrap_or(ERROR_NOT_SPECIFIED);
            format!("Q{}: {}", key, detail)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_ids(ids: &[QuestionId]) -> String {
    ids.iter()
        .map(|q| q.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 知识点记录及其摘要文本
#[derive(Debug, Clone, Serialize)]
pub struct ConceptSummary {
    pub concept: String,
    pub performance_summary: String,
    pub mistake_details: String,
}

impl ConceptSummary {
    pub fn from_record(record: &ConceptRecord) -> Self {
        Self {
            concept: record.concept.clone(),
            performance_summary: performance_summary(record),
            mistake_details: mistake_details(record),
        }
    }
}

/// 题目级运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuestionStats {
    pub total: usize,
    pub with_mistakes: usize,
    pub degraded: usize,
}

impl QuestionStats {
    pub fn from_outcomes(outcomes: &[QuestionOutcome]) -> Self {
        Self {
            total: outcomes.len(),
            with_mistakes: outcomes
                .iter()
                .filter(|o| !o.is_degraded() && o.record().has_mistake)
                .count(),
            degraded: outcomes.iter().filter(|o| o.is_degraded()).count(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("分析题目总数: {}", self.total),
            format!("有错误的题目: {}", self.with_mistakes),
            format!("分析失败的题目: {}", self.degraded),
        ]
    }
}

/// 知识点级运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConceptStats {
    pub total_concepts: usize,
    pub concepts_tested: usize,
    pub total_mistakes: usize,
}

impl ConceptStats {
    pub fn from_records(records: &[ConceptRecord]) -> Self {
        Self {
            total_concepts: records.len(),
            concepts_tested: records.iter().filter(|r| r.is_tested()).count(),
            total_mistakes: records.iter().map(|r| r.mistakes_count()).sum(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("知识点总数: {}", self.total_concepts),
            format!("考查到的知识点: {}", self.concepts_tested),
            format!("错误总数: {}", self.total_mistakes),
        ]
    }
}
