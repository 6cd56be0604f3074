//! 各阶段的提示词
//!
//! 每个提示词都要求模型只返回一个 JSON 值，字段结构与
//! [`crate::services::normalizer`] 中的规范化函数一一对应。

use crate::models::QuestionId;

/// 识别试卷中的所有题号
pub fn identify_questions() -> String {
    r#"Look at this question paper and list EVERY question number that appears in it.

Return ONLY a JSON array of question numbers in the order they appear, like this:
[1, 2, 3, 4, 5]

Do not skip any question. Do not include sub-part letters.
Return ONLY the JSON array, nothing else."#
        .to_string()
}

/// 单题分析：题目、参考解答、学生作答、是否有错
pub fn analyze_single_question(question: &QuestionId) -> String {
    format!(
        r#"The first images are the question paper; the remaining images are the student's answer sheet.

Focus ONLY on question {q}.

1. Transcribe the text of question {q} from the question paper.
2. Solve question {q} yourself, step by step.
3. Transcribe the student's answer to question {q} from the answer sheet.
4. Compare the student's answer with your solution and decide whether the student made a mistake.
5. If there is a mistake, describe exactly what went wrong.

Return your analysis as a JSON object:
{{
    "question_number": {q},
    "question_text": "<text of the question>",
    "gemini_solution": "<your complete solution>",
    "student_answer": "<the student's answer>",
    "has_mistake": true,
    "mistake_description": "<what the student got wrong, or an empty string>"
}}

Return ONLY the JSON object, nothing else."#,
        q = question
    )
}

/// 从知识点清单中提取知识点名称
pub fn extract_concepts() -> String {
    r#"Analyze this analysis sheet and extract ALL concepts listed in the "Concept (With Explanation)" column.

Return ONLY a JSON array of concept names, like this:
["Basic Formulas", "Application of Formulae", "Basic Trigonometric Ratios Integration"]

Extract every single concept from the sheet. Be thorough and precise.
Return ONLY the JSON array, nothing else."#
        .to_string()
}

/// 题目与知识点的对应关系，附带逐题推理
pub fn map_questions_to_concepts(concepts: &[String]) -> String {
    let concept_list = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this question paper and identify which questions test which concepts.

Here are the concepts to look for:
{concept_list}

For each concept, identify ALL question numbers that test or require that concept.
A single question may test multiple concepts.
Use the concept names exactly as written above.

For every question, explain your reasoning: summarize what the question asks,
list the concepts it aligns with (with a rationale and a confidence of "low", "medium" or "high"),
and list the concepts you considered but rejected (with a reason).

Return your analysis as a JSON object:
{{
    "concept_map": {{
        "Basic Formulas": [1, 3, 5],
        "Application of Formulae": [2, 4]
    }},
    "question_reasoning": [
        {{
            "question": 1,
            "summary": "<what the question asks>",
            "concept_alignments": [
                {{"concept": "Basic Formulas", "rationale": "<why>", "confidence": "high"}}
            ],
            "considered_but_rejected": [
                {{"concept": "Application of Formulae", "reason": "<why not>"}}
            ]
        }}
    ],
    "evaluation_notes": ["<any caveats about the paper or the mapping>"]
}}

Include ALL concepts from the list in "concept_map", even if no questions test them (use an empty array []).
Be thorough - analyze every question carefully.
Return ONLY the JSON object, nothing else."#
    )
}

/// 学生在单个知识点上的表现
pub fn evaluate_concept_performance(concept: &str, question_numbers: &[QuestionId]) -> String {
    let questions = question_numbers
        .iter()
        .map(|q| q.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"The first images are the question paper; the remaining images are the student's answer sheet.

Analyze the student's performance for the concept: "{concept}"

Questions that test this concept: {questions}

Compare the student's answers with the correct approach for each question.
Specifically focus on how the student applied (or failed to apply) the concept: "{concept}"

For each question:
1. Did the student make a mistake related to this concept?
2. If yes, what exactly was the mistake?

Return your analysis as a JSON object:
{{
    "mistakes": [2, 5],
    "details": {{
        "2": "Wrong integration of tan^2 x - forgot to use substitution",
        "5": "Incorrect formula application - used wrong power rule"
    }},
    "reasoning": [
        {{
            "question": 2,
            "observation": "<what the student wrote>",
            "concept_evaluation": "<how the concept was applied>",
            "conclusion": "<correct or mistaken, and why>",
            "confidence": "medium"
        }}
    ],
    "evaluation_notes": ["<any caveats, e.g. illegible handwriting>"]
}}

"mistakes" lists question numbers where mistakes were made; "details" is keyed by those question numbers.
Be specific about the mistakes. Only include questions where the student made errors related to "{concept}".
If no mistakes were made, return empty arrays/objects.
Return ONLY the JSON object, nothing else."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_prompt_lists_concepts_in_order() {
        let prompt = map_questions_to_concepts(&["Limits".to_string(), "Series".to_string()]);
        let limits = prompt.find("1. Limits").unwrap();
        let series = prompt.find("2. Series").unwrap();
        assert!(limits < series);
        assert!(prompt.contains("\"concept_map\""));
    }

    #[test]
    fn test_evaluation_prompt_names_concept_and_questions() {
        let prompt = evaluate_concept_performance(
            "Chain Rule",
            &[QuestionId::Number(3), QuestionId::Number(7)],
        );
        assert!(prompt.contains("\"Chain Rule\""));
        assert!(prompt.contains("Questions that test this concept: 3, 7"));
    }

    #[test]
    fn test_single_question_prompt_targets_question() {
        let prompt = analyze_single_question(&QuestionId::Number(4));
        assert!(prompt.contains("Focus ONLY on question 4."));
        assert!(prompt.contains("\"gemini_solution\""));
    }
}
