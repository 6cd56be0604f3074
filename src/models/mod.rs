pub mod confidence;
pub(crate) mod lenient;
pub mod payload;
pub mod question_id;
pub mod records;

pub use confidence::ConfidenceLevel;
pub use payload::ImagePayload;
pub use question_id::QuestionId;
pub use records::{
    ConceptAlignment, ConceptEvaluation, ConceptMapping, ConceptRecord, PerformanceReasoningEntry,
    ProjectedReasoning, QuestionOutcome, QuestionRecord, ReasoningEntry, RejectedConcept,
};
