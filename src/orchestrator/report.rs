//! 分析报告
//!
//! 一次运行的完整输出，序列化为 JSON 交给报表渲染方。

use serde::Serialize;

use crate::models::{ConceptRecord, QuestionOutcome};
use crate::services::{ConceptStats, ConceptSummary, QuestionStats};
use crate::workflow::ConceptReport;

/// 报告正文
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "pipeline", rename_all = "snake_case")]
pub enum ReportBody {
    /// 题目级分析
    Questions {
        records: Vec<QuestionOutcome>,
        stats: QuestionStats,
    },
    /// 知识点级分析
    Concepts {
        records: Vec<ConceptRecord>,
        summaries: Vec<ConceptSummary>,
        mapping_notes: Vec<String>,
        stats: ConceptStats,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// 使用的模型
    pub model: String,
    /// 生成时间（本地时间）
    pub generated_at: String,
    #[serde(flatten)]
    pub body: ReportBody,
}

impl AnalysisReport {
    pub fn questions(model: impl Into<String>, records: Vec<QuestionOutcome>) -> Self {
        let stats = QuestionStats::from_outcomes(&records);
        Self::new(model, ReportBody::Questions { records, stats })
    }

    pub fn concepts(model: impl Into<String>, report: ConceptReport) -> Self {
        let summaries = report.records.iter().map(ConceptSummary::from_record).collect();
        let stats = ConceptStats::from_records(&report.records);
        Self::new(
            model,
            ReportBody::Concepts {
                records: report.records,
                summaries,
                mapping_notes: report.mapping_notes,
                stats,
            },
        )
    }

    fn new(model: impl Into<String>, body: ReportBody) -> Self {
        Self {
            model: model.into(),
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            body,
        }
    }

    /// 统计行（写入日志）
    pub fn stat_lines(&self) -> Vec<String> {
        match &self.body {
            ReportBody::Questions { stats, .. } => stats.lines(),
            ReportBody::Concepts { stats, .. } => stats.lines(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionId, QuestionRecord};

    #[test]
    fn test_question_report_json_shape() {
        let report = AnalysisReport::questions(
            "gemini-2.5-pro",
            vec![QuestionOutcome::Degraded(QuestionRecord::placeholder(
                &QuestionId::Number(1),
                "timeout",
            ))],
        );
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["pipeline"], "questions");
        assert_eq!(value["model"], "gemini-2.5-pro");
        assert_eq!(value["records"][0]["status"], "degraded");
        assert_eq!(value["records"][0]["gemini_solution"], "Solution not available");
        assert_eq!(value["stats"]["degraded"], 1);
    }

    #[test]
    fn test_concept_report_includes_summaries() {
        let report = AnalysisReport::concepts(
            "gemini-2.5-flash",
            ConceptReport {
                records: vec![ConceptRecord::untested("Limits")],
                mapping_notes: vec!["Page 2 is blurry".to_string()],
            },
        );
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["pipeline"], "concepts");
        assert_eq!(value["summaries"][0]["performance_summary"], "Not tested in this paper");
        assert_eq!(value["records"][0]["concept_reasoning"], serde_json::json!([]));
        assert_eq!(value["mapping_notes"][0], "Page 2 is blurry");
        assert_eq!(report.stat_lines().len(), 3);
    }
}
