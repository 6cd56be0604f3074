pub mod normalizer;
pub mod progress;
pub mod prompts;
pub mod reasoning_projector;
pub mod response_parser;
pub mod summary;
pub mod throttle;

pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use response_parser::parse_response;
pub use summary::{ConceptStats, ConceptSummary, QuestionStats};
pub use throttle::{FixedDelay, NoDelay, Throttle};
