use labbot_core::config::DEFAULT_MIN_RESPONSE_CHARS;
use labbot_core::FallbackProvider;

pub const GREETINGS: [&str; 6] =
    ["hi", "hello", "hey", "good morning", "good afternoon", "good evening"];

pub const DISCLAIMER_PHRASES: [&str; 10] = [
    "i don't know",
    "i'm not sure",
    "i cannot provide",
    "i can't provide",
    "sorry, i don't have",
    "i don't have information",
    "i'm unable to",
    "i apologize, but i don't know",
    "couldn't generate a proper response",
    "i couldn't find",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { reason_code: &'static str },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::Deny { reason_code } => Some(reason_code),
        }
    }
}

/// Decides whether a query is worth sending to the agent at all.
#[derive(Clone, Debug, Default)]
pub struct ScopeGate;

impl ScopeGate {
    pub fn new() -> Self {
        Self
    }

    pub fn is_greeting(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();
        GREETINGS.iter().any(|greeting| lowered.contains(greeting))
    }

    pub fn evaluate(&self, query: &str, classifier: &dyn FallbackProvider) -> GateDecision {
        if self.is_greeting(query) || classifier.is_educational_query(query) {
            GateDecision::Allow
        } else {
            GateDecision::Deny { reason_code: "out_of_scope" }
        }
    }
}

/// Decides whether a cleaned agent answer can be shown as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelevanceGate {
    min_chars: usize,
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RESPONSE_CHARS)
    }
}

impl RelevanceGate {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn evaluate(&self, response: &str) -> GateDecision {
        let trimmed = response.trim();
        if trimmed.is_empty() {
            return GateDecision::Deny { reason_code: "empty_response" };
        }

        // Models emit typographic apostrophes as often as ASCII ones.
        let lowered = trimmed.to_lowercase().replace('\u{2019}', "'");
        if DISCLAIMER_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            return GateDecision::Deny { reason_code: "disclaimer" };
        }

        if trimmed.chars().count() < self.min_chars {
            return GateDecision::Deny { reason_code: "too_short" };
        }

        GateDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use labbot_core::{FallbackProvider, KeywordFallback, ProcessedResponse};

    use super::{GateDecision, RelevanceGate, ScopeGate};

    struct RejectEverything;

    impl FallbackProvider for RejectEverything {
        fn get_fallback_response(&self, _query: &str) -> String {
            "fallback".to_string()
        }

        fn is_educational_query(&self, _query: &str) -> bool {
            false
        }

        fn process_response(&self, response: &str, _query: &str) -> ProcessedResponse {
            ProcessedResponse { text: response.to_string(), used_fallback: false }
        }

        fn enhance_response(&self, response: &str, _query: &str) -> String {
            response.to_string()
        }
    }

    #[test]
    fn greetings_pass_regardless_of_classifier() {
        let gate = ScopeGate::new();

        assert!(gate.evaluate("hello", &RejectEverything).is_allowed());
        assert!(gate.evaluate("Hey there!", &RejectEverything).is_allowed());
        assert!(gate.evaluate("Good Morning, team", &RejectEverything).is_allowed());
    }

    #[test]
    fn greeting_matches_anywhere_in_the_query() {
        let gate = ScopeGate::new();

        for query in ["hellooo there", "Othello tickets", "hello123"] {
            assert!(gate.evaluate(query, &RejectEverything).is_allowed(), "{query} should pass");
        }
        assert_eq!(
            gate.evaluate("Who won the football game?", &RejectEverything),
            GateDecision::Deny { reason_code: "out_of_scope" }
        );
    }

    #[test]
    fn non_greetings_defer_to_the_classifier() {
        let gate = ScopeGate::new();
        let classifier = KeywordFallback::default();

        assert!(gate.evaluate("What courses do you offer?", &classifier).is_allowed());
        assert!(!gate.evaluate("Who won the football game?", &classifier).is_allowed());
    }

    #[test]
    fn relevance_gate_rejects_empty_and_short_answers() {
        let gate = RelevanceGate::default();

        assert_eq!(gate.evaluate("   "), GateDecision::Deny { reason_code: "empty_response" });
        assert_eq!(gate.evaluate("Robotics"), GateDecision::Deny { reason_code: "too_short" });
        assert!(gate.evaluate("Robotics\nAI Basics").is_allowed());
    }

    #[test]
    fn length_is_measured_on_trimmed_text() {
        let gate = RelevanceGate::new(10);

        assert!(!gate.evaluate("   short    ").is_allowed());
        assert!(gate.evaluate("  ten chars!  ").is_allowed());
    }

    #[test]
    fn relevance_gate_rejects_disclaimers_case_insensitively() {
        let gate = RelevanceGate::default();

        for answer in [
            "I don't know the answer to that question.",
            "Sorry, I don't have details about parking.",
            "I'M UNABLE TO help with tax questions here.",
            "I couldn't find anything in the knowledge base.",
            "I don\u{2019}t know anything about that topic.",
        ] {
            assert_eq!(
                gate.evaluate(answer),
                GateDecision::Deny { reason_code: "disclaimer" },
                "{answer}"
            );
        }
    }

    #[test]
    fn deny_exposes_its_reason_code() {
        let decision = RelevanceGate::default().evaluate("");

        assert_eq!(decision.reason_code(), Some("empty_response"));
        assert_eq!(GateDecision::Allow.reason_code(), None);
    }
}
