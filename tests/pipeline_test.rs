use performance_analyzer::error::{AnalysisError, Stage, StageError};
use async_trait::async_trait;
use performance_analyzer::services::Throttle;
use performance_analyzer::{
    AnalysisCtx, Analyzer, ConceptFlow, Config, DocumentSet, ImagePayload, MockGateway, MockReply,
    QuestionFlow, QuestionId,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

fn page(tag: u8) -> ImagePayload {
    ImagePayload::new(vec![tag; 16], "image/png")
}

/// 只计数、不等待的节流器
#[derive(Default)]
struct CountingThrottle {
    paced: AtomicUsize,
}

impl CountingThrottle {
    fn count(&self) -> usize {
        self.paced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pace(&self) {
        self.paced.fetch_add(1, Ordering::SeqCst);
    }
}

/// 记录进度消息和节流次数的上下文
struct Recording {
    ctx: AnalysisCtx,
    seen: Arc<Mutex<Vec<String>>>,
    throttle: Arc<CountingThrottle>,
}

fn recording_ctx(gateway: Arc<MockGateway>) -> Recording {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = seen.clone();
        move |stage: &str| seen.lock().unwrap().push(stage.to_string())
    };
    let throttle = Arc::new(CountingThrottle::default());
    let ctx = AnalysisCtx::new(gateway)
        .with_throttle(throttle.clone())
        .with_progress(Arc::new(sink));
    Recording {
        ctx,
        seen,
        throttle,
    }
}

fn question_reply(n: i64, has_mistake: bool, description: &str) -> MockReply {
    MockReply::text(
        json!({
            "question_number": n,
            "question_text": format!("Evaluate integral {}", n),
            "gemini_solution": "x^2/2 + C",
            "student_answer": "x^2/2",
            "has_mistake": has_mistake,
            "mistake_description": description
        })
        .to_string(),
    )
}

// ========== 题目级流程 ==========

#[tokio::test]
async fn test_question_pipeline_soft_fails_single_item() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text("```json\n[1, 2]\n```"),
        question_reply(1, true, "Dropped the constant of integration"),
        MockReply::failure("503 Service Unavailable"),
    ]));
    let rec = recording_ctx(gateway.clone());

    let outcomes = assert_ok!(QuestionFlow::new(rec.ctx).run(&[page(1)], &[page(2)]).await);

    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[0].is_degraded());
    assert!(outcomes[0].record().has_mistake);

    assert!(outcomes[1].is_degraded());
    let degraded = outcomes[1].record();
    assert_eq!(degraded.question_number, QuestionId::Number(2));
    assert!(!degraded.has_mistake);
    assert!(degraded.mistake_description.contains("503 Service Unavailable"));
    assert_eq!(gateway.call_count(), 3);
    // 失败的单题同样要等待
    assert_eq!(rec.throttle.count(), 2);
}

#[tokio::test]
async fn test_question_pipeline_aborts_when_nothing_identified() {
    let gateway = Arc::new(MockGateway::with_replies([MockReply::text("[]")]));
    let rec = recording_ctx(gateway.clone());

    let err: StageError = assert_err!(QuestionFlow::new(rec.ctx).run(&[page(1)], &[page(2)]).await);

    assert_eq!(err.stage, Stage::IdentifyQuestions);
    assert!(matches!(err.source, AnalysisError::Input(_)));
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(rec.throttle.count(), 0);
}

#[tokio::test]
async fn test_question_pipeline_progress_messages() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text("[1, 2]"),
        question_reply(1, false, ""),
        question_reply(2, false, ""),
    ]));
    let rec = recording_ctx(gateway);

    assert_ok!(QuestionFlow::new(rec.ctx).run(&[page(1)], &[page(2)]).await);

    assert_eq!(
        *rec.seen.lock().unwrap(),
        vec![
            "Identifying questions in the question paper...",
            "Analyzing question 1/2",
            "Analyzing question 2/2",
            "Analysis complete!",
        ]
    );
}

// ========== 知识点级流程 ==========

#[tokio::test]
async fn test_untested_concept_is_never_evaluated() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text(r#"["A", "B"]"#),
        MockReply::text(r#"{"concept_map": {"A": [1, 2], "B": []}, "question_reasoning": []}"#),
        MockReply::text(r#"{"mistakes": ["2"], "details": {"2": "Sign error"}}"#),
    ]));
    let rec = recording_ctx(gateway.clone());

    let report = assert_ok!(
        ConceptFlow::new(rec.ctx)
            .run(&[page(0)], &[page(1)], &[page(2)])
            .await
    );

    assert_eq!(gateway.call_count(), 3);
    // 只有 A 发起了评估调用
    assert_eq!(rec.throttle.count(), 1);
    let prompts: Vec<String> = gateway.calls().into_iter().map(|c| c.prompt).collect();
    assert!(prompts[2].contains("\"A\""));

    let b = &report.records[1];
    assert_eq!(b.concept, "B");
    assert_eq!(b.tested_count(), 0);
    assert_eq!(b.mistakes_count(), 0);

    let a = &report.records[0];
    assert_eq!(a.mistake_questions(), &[QuestionId::Number(2)]);
    assert_eq!(a.details()["2"], "Sign error");

    assert_eq!(
        *rec.seen.lock().unwrap(),
        vec![
            "Extracting concepts from analysis sheet...",
            "Analyzing question paper for 2 concepts...",
            "Analyzing concept 1/2: A",
            "Analyzing concept 2/2: B",
            "Analysis complete!",
        ]
    );
}

#[tokio::test]
async fn test_counts_match_lists_and_every_concept_is_reported() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text(r#"["Limits", "Continuity", "Series"]"#),
        // 映射中缺少 Continuity
        MockReply::text(
            json!({
                "concept_map": {"Limits": ["1", 3], "Series": [4]},
                "question_reasoning": [
                    {
                        "question": 1,
                        "summary": "Limit at infinity",
                        "concept_alignments": [
                            {"concept": "Limits", "rationale": "direct", "confidence": "low"},
                            {"concept": "Limits", "rationale": "L'Hopital", "confidence": "high"}
                        ],
                        "considered_but_rejected": [{"concept": "Series", "reason": "no sum"}]
                    },
                    {
                        "question": 4,
                        "summary": "Geometric series",
                        "concept_alignments": [{"concept": "Series", "rationale": "sum"}]
                    }
                ]
            })
            .to_string(),
        ),
        MockReply::text(r#"{"mistakes": [1, 3, "3"], "details": {"1": "Wrong limit", "3": "Skipped step"}}"#),
        MockReply::text(r#"{"mistakes": [], "details": {}, "evaluation_notes": "clean work"}"#),
    ]));
    let rec = recording_ctx(gateway.clone());

    let report = assert_ok!(
        ConceptFlow::new(rec.ctx)
            .run(&[page(0)], &[page(1)], &[page(2)])
            .await
    );

    let concepts: Vec<&str> = report.records.iter().map(|r| r.concept.as_str()).collect();
    assert_eq!(concepts, vec!["Limits", "Continuity", "Series"]);

    for record in &report.records {
        assert_eq!(record.mistakes_count(), record.mistake_questions().len());
        assert_eq!(record.tested_count(), record.question_numbers().len());
        for key in record.details().keys() {
            assert!(record
                .mistake_questions()
                .iter()
                .any(|q| &q.to_string() == key));
        }
    }

    let limits = &report.records[0];
    assert_eq!(
        limits.question_numbers(),
        &[QuestionId::Number(1), QuestionId::Number(3)]
    );
    assert_eq!(limits.mistakes_count(), 2);
    assert_eq!(limits.concept_reasoning.len(), 1);
    assert_eq!(
        limits.concept_reasoning[0].confidence,
        performance_analyzer::models::ConfidenceLevel::High
    );
    assert_eq!(limits.concept_reasoning[0].rejected_concepts, vec!["Series"]);

    assert!(!report.records[1].is_tested());

    let series = &report.records[2];
    assert_eq!(
        series.concept_reasoning[0].confidence,
        performance_analyzer::models::ConfidenceLevel::Medium
    );
    assert_eq!(series.performance_notes, vec!["clean work"]);

    // 抽取 + 映射 + 两个被考查的知识点
    assert_eq!(gateway.call_count(), 4);
    assert_eq!(rec.throttle.count(), 2);
}

#[tokio::test]
async fn test_mapping_without_notes_is_not_an_error() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text(r#"["A"]"#),
        MockReply::text(r#"{"concept_map": {"A": []}, "question_reasoning": []}"#),
    ]));
    let rec = recording_ctx(gateway);

    let report = assert_ok!(
        ConceptFlow::new(rec.ctx)
            .run(&[page(0)], &[page(1)], &[page(2)])
            .await
    );
    assert!(report.mapping_notes.is_empty());
    assert_eq!(report.records.len(), 1);
    assert_eq!(rec.throttle.count(), 0);
}

#[tokio::test]
async fn test_malformed_mapping_aborts_run_naming_stage() {
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text(r#"["A", "B"]"#),
        MockReply::text("Sorry, I cannot map these questions."),
        MockReply::text(r#"{"mistakes": []}"#),
    ]));
    let rec = recording_ctx(gateway.clone());

    let err: StageError = assert_err!(
        ConceptFlow::new(rec.ctx)
            .run(&[page(0)], &[page(1)], &[page(2)])
            .await
    );

    assert_eq!(err.stage, Stage::MapQuestionsToConcepts);
    assert!(matches!(err.source, AnalysisError::Parse { .. }));
    assert!(err.to_string().contains("map_questions_to_concepts"));
    assert!(err.to_string().contains("Sorry, I cannot map"));
    assert_eq!(gateway.remaining_replies(), 1);
}

// ========== 编排层 ==========

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        llm_api_key: "test-key".to_string(),
        output_log_file: dir.path().join("run.txt").to_string_lossy().into_owned(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_analyzer_writes_report_and_run_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let gateway = Arc::new(MockGateway::with_replies([
        MockReply::text("[1]"),
        question_reply(1, true, "Wrong sign"),
    ]));
    let analyzer = Analyzer::with_context(config.clone(), recording_ctx(gateway).ctx);

    let documents = DocumentSet {
        question_paper: vec![page(1)],
        answer_sheet: vec![page(2)],
        ..Default::default()
    };
    let report = assert_ok!(analyzer.analyze_questions(&documents).await);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["pipeline"], "questions");
    assert_eq!(value["model"], "mock-model");
    assert_eq!(value["records"][0]["status"], "analyzed");
    assert_eq!(value["stats"]["with_mistakes"], 1);

    let log = std::fs::read_to_string(&config.output_log_file).unwrap();
    assert!(log.contains("分析题目总数: 1"));
}

#[tokio::test]
async fn test_analyzer_surfaces_stage_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let gateway = Arc::new(MockGateway::with_replies([MockReply::failure("timeout")]));
    let analyzer = Analyzer::with_context(config.clone(), recording_ctx(gateway).ctx);

    let documents = DocumentSet {
        question_paper: vec![page(1)],
        answer_sheet: vec![page(2)],
        concept_sheet: vec![page(3)],
    };
    let err = assert_err!(analyzer.analyze_concepts(&documents).await);

    let stage_err = err.downcast_ref::<StageError>().expect("应为阶段错误");
    assert_eq!(stage_err.stage, Stage::ExtractConcepts);

    let log = std::fs::read_to_string(&config.output_log_file).unwrap();
    assert!(log.contains("extract_concepts"));
}

#[tokio::test]
async fn test_analyzer_requires_concept_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let analyzer = Analyzer::with_context(test_config(&dir), recording_ctx(gateway.clone()).ctx);

    let documents = DocumentSet {
        question_paper: vec![page(1)],
        answer_sheet: vec![page(2)],
        ..Default::default()
    };
    assert_err!(analyzer.analyze_concepts(&documents).await);
    assert_eq!(gateway.call_count(), 0);
}
