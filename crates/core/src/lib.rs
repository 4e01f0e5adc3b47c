pub mod config;
pub mod errors;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod sanitize;

pub use errors::{ApplicationError, InterfaceError};
pub use extract::CourseHeadingExtractor;
pub use fallback::{FallbackProvider, FallbackTopic, KeywordFallback, ProcessedResponse};
pub use prompt::SystemPrompt;
pub use sanitize::{sanitize_agent_output, ResponseCleaner, SanitizePipeline, SanitizeStage};
