use super::pipeline::SanitizePipeline;
use crate::prompt::SystemPrompt;

pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "I couldn't generate a proper response.";
pub const MIN_CLEANED_CHARS: usize = 5;

/// Final tidy-up of a sanitized answer before extraction and gating.
#[derive(Debug)]
pub struct ResponseCleaner {
    pipeline: SanitizePipeline,
    short_response_prompt: String,
}

impl ResponseCleaner {
    pub fn new(short_response_prompt: impl Into<String>) -> Self {
        Self {
            pipeline: SanitizePipeline::response_cleanup(),
            short_response_prompt: short_response_prompt.into(),
        }
    }

    pub fn clean(&self, response: &str, query: &str) -> String {
        if response.trim().is_empty() {
            return EMPTY_RESPONSE_PLACEHOLDER.to_string();
        }

        let cleaned = self.pipeline.run(response, query);
        if cleaned.chars().count() < MIN_CLEANED_CHARS {
            return self.short_response_prompt.clone();
        }

        cleaned
    }
}

impl Default for ResponseCleaner {
    fn default() -> Self {
        Self::new(SystemPrompt::default().short_response_prompt())
    }
}

#[cfg(test)]
mod tests {
    use super::{ResponseCleaner, EMPTY_RESPONSE_PLACEHOLDER};

    const ASK_ME_SOMETHING: &str =
        "I'm here to help you with Lab of Future information. What would you like to know?";

    #[test]
    fn whitespace_input_returns_placeholder() {
        let cleaner = ResponseCleaner::default();
        assert_eq!(cleaner.clean("  \n\t \n", "anything"), EMPTY_RESPONSE_PLACEHOLDER);
        assert_eq!(cleaner.clean("", "anything"), EMPTY_RESPONSE_PLACEHOLDER);
    }

    #[test]
    fn short_result_returns_ask_me_something_prompt() {
        let cleaner = ResponseCleaner::default();
        assert_eq!(cleaner.clean("ok", "hours"), ASK_ME_SOMETHING);
        assert_eq!(cleaner.clean("Message\nyes", "hours"), ASK_ME_SOMETHING);
    }

    #[test]
    fn query_only_answer_collapses_to_prompt() {
        let cleaner = ResponseCleaner::default();
        assert_eq!(cleaner.clean("Opening hours\nopening hours", "Opening hours"), ASK_ME_SOMETHING);
    }

    #[test]
    fn markers_and_query_prefix_are_removed() {
        let cleaner = ResponseCleaner::default();
        let cleaned = cleaner.clean(
            "Message\n  where are you located where are you located We are in Pune.  \n\nResponse\nVisit us anytime.",
            "Where are you located",
        );
        assert_eq!(cleaned, "We are in Pune.\nVisit us anytime.");
    }

    #[test]
    fn custom_prompt_is_used_for_short_results() {
        let cleaner = ResponseCleaner::new("Ask me about the academy.");
        assert_eq!(cleaner.clean("hm", "q"), "Ask me about the academy.");
    }
}
