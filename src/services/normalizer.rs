//! 响应约定规范化
//!
//! 把解析后的 JSON 转换为各阶段的类型化记录：
//! - 缺失的字段用默认值补齐（空列表 / 空映射 / 占位文本），而不是报错
//! - 题号统一转换为整数，无法识别的原样保留并记录警告
//! - 结构性错误（例如需要对象却给了数组）返回 `Contract` 错误

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::lenient::{text_of, truthy, type_name};
use crate::models::records::{
    MISTAKE_NOT_DESCRIBED, QUESTION_TEXT_MISSING, SOLUTION_MISSING, STUDENT_ANSWER_MISSING,
};
use crate::models::{ConceptEvaluation, ConceptMapping, QuestionId, QuestionRecord};

/// 题号列表（identify_questions）
pub fn normalize_question_list(value: Value) -> AnalysisResult<Vec<QuestionId>> {
    let items = expect_array(value, "题号列表")?;
    let ids: Vec<QuestionId> = items.into_iter().map(QuestionId::from_value).collect();
    warn_unrecognized(&ids, "题号列表");
    Ok(ids)
}

/// 知识点列表（extract_concepts）
///
/// 去掉空名称；重复的名称只保留第一次出现。
pub fn normalize_concept_list(value: Value) -> AnalysisResult<Vec<String>> {
    let items = expect_array(value, "知识点列表")?;
    let mut concepts: Vec<String> = Vec::with_capacity(items.len());
    for item in &items {
        let Some(name) = text_of(item).filter(|s| !s.is_empty()) else {
            continue;
        };
        if concepts.contains(&name) {
            warn!("⚠️ 知识点重复，已忽略: {}", name);
            continue;
        }
        concepts.push(name);
    }
    Ok(concepts)
}

/// 单题分析（analyze_single_question）
///
/// 记录的题号以驱动方请求的题号为准。
pub fn normalize_question_analysis(
    value: Value,
    requested: &QuestionId,
) -> AnalysisResult<QuestionRecord> {
    let mut fields = match value {
        Value::Object(map) => map,
        other => {
            return Err(AnalysisError::Contract(format!(
                "单题分析应为 JSON 对象，实际为 {}",
                type_name(&other)
            )))
        }
    };

    if let Some(returned) = fields.remove("question_number").map(QuestionId::from_value) {
        if &returned != requested {
            warn!(
                "⚠️ 模型返回的题号 {} 与请求的题号 {} 不一致",
                returned, requested
            );
        }
    }

    let mut text_field = |key: &str, fallback: &str| {
        fields
            .remove(key)
            .as_ref()
            .and_then(text_of)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    let question_text = text_field("question_text", QUESTION_TEXT_MISSING);
    let reference_solution = text_field("gemini_solution", SOLUTION_MISSING);
    let student_answer = text_field("student_answer", STUDENT_ANSWER_MISSING);
    let description = text_field("mistake_description", "");

    let has_mistake = fields.get("has_mistake").map(truthy).unwrap_or(false);
    let mistake_description = if has_mistake && description.is_empty() {
        MISTAKE_NOT_DESCRIBED.to_string()
    } else {
        description
    };

    Ok(QuestionRecord {
        question_number: requested.clone(),
        question_text,
        reference_solution,
        student_answer,
        has_mistake,
        mistake_description,
    })
}

/// 题目-知识点映射（map_questions_to_concepts）
///
/// 每个传入的知识点都会出现在 `concept_map` 中，缺失时为空列表。
pub fn normalize_concept_mapping(
    value: Value,
    concepts: &[String],
) -> AnalysisResult<ConceptMapping> {
    let mut mapping: ConceptMapping = decode_object(value, "题目-知识点映射")?;

    for concept in concepts {
        if !mapping.concept_map.contains_key(concept) {
            debug!("知识点 {} 未出现在映射中，按未考查处理", concept);
            mapping.concept_map.insert(concept.clone(), Vec::new());
        }
    }

    for (concept, ids) in &mapping.concept_map {
        if !concepts.contains(concept) {
            warn!("⚠️ 映射中出现了未知知识点: {}", concept);
        }
        warn_unrecognized(ids, concept);
    }

    Ok(mapping)
}

/// 知识点表现评估（evaluate_concept_performance）
///
/// 错题去重；`details` 的键统一为题号字符串，且只保留错题中出现的题号。
pub fn normalize_concept_evaluation(
    value: Value,
    concept: &str,
    question_numbers: &[QuestionId],
) -> AnalysisResult<ConceptEvaluation> {
    let mut evaluation: ConceptEvaluation = decode_object(value, "知识点表现评估")?;

    let mut mistakes: Vec<QuestionId> = Vec::with_capacity(evaluation.mistakes.len());
    for id in evaluation.mistakes.drain(..) {
        if !mistakes.contains(&id) {
            mistakes.push(id);
        }
    }
    warn_unrecognized(&mistakes, concept);
    for id in &mistakes {
        if !question_numbers.contains(id) {
            warn!("⚠️ [{}] 错题 {} 不在该知识点的题目列表中", concept, id);
        }
    }

    let mistake_keys: Vec<String> = mistakes.iter().map(|id| id.to_string()).collect();
    let mut details = BTreeMap::new();
    for (key, description) in std::mem::take(&mut evaluation.details) {
        let normalized = QuestionId::from_key(&key).to_string();
        if mistake_keys.contains(&normalized) {
            details.insert(normalized, description);
        } else {
            warn!("⚠️ [{}] 题目 {} 有错误说明但不在错题列表中，已忽略", concept, key);
        }
    }

    evaluation.mistakes = mistakes;
    evaluation.details = details;
    Ok(evaluation)
}

// ========== 辅助函数 ==========

fn expect_array(value: Value, what: &str) -> AnalysisResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(AnalysisError::Contract(format!(
            "{}应为 JSON 数组，实际为 {}",
            what,
            type_name(&other)
        ))),
    }
}

fn decode_object<T: DeserializeOwned>(value: Value, what: &str) -> AnalysisResult<T> {
    if !value.is_object() {
        return Err(AnalysisError::Contract(format!(
            "{}应为 JSON 对象，实际为 {}",
            what,
            type_name(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| AnalysisError::Contract(format!("{}字段类型错误: {}", what, e)))
}

fn warn_unrecognized(ids: &[QuestionId], context: &str) {
    for id in ids.iter().filter(|id| !id.is_recognized()) {
        warn!("⚠️ [{}] 无法识别的题号: {}", context, id);
    }
}
