pub mod concept_flow;
pub mod context;
pub mod question_flow;

pub use concept_flow::{ConceptFlow, ConceptReport};
pub use context::AnalysisCtx;
pub use question_flow::QuestionFlow;
