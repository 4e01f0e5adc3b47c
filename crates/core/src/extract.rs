use std::sync::OnceLock;

use regex::Regex;

pub const COURSE_TRIGGERS: [&str; 3] = ["course", "program", "lab program"];

fn bold_title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+\.\s*\*\*(.*?)\*\*[:.]?").expect("bold title pattern must compile")
    })
}

fn number_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("number prefix pattern must compile"))
}

fn numbered_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s*.+").expect("numbered line pattern must compile"))
}

/// Reduces a numbered course listing to its titles.
#[derive(Clone, Debug, Default)]
pub struct CourseHeadingExtractor;

impl CourseHeadingExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn is_triggered(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        COURSE_TRIGGERS.iter().any(|trigger| query.contains(trigger))
    }

    pub fn extract(&self, response: &str) -> String {
        let titles =
            response.split('\n').filter_map(|line| title_of(line.trim())).collect::<Vec<_>>();

        if titles.is_empty() {
            return response.to_string();
        }
        titles.join("\n")
    }

    /// Runs [`Self::extract`] only when the query asks about courses or programs.
    pub fn apply(&self, response: &str, query: &str) -> String {
        if self.is_triggered(query) {
            self.extract(response)
        } else {
            response.to_string()
        }
    }
}

fn title_of(line: &str) -> Option<String> {
    if let Some(captures) = bold_title_pattern().captures(line) {
        return captures.get(1).map(|title| title.as_str().trim().to_string());
    }

    if let Some((before_colon, _)) = line.split_once(':') {
        let title = number_prefix_pattern().replace(before_colon.trim(), "");
        return (!title.is_empty()).then(|| title.into_owned());
    }

    if numbered_line_pattern().is_match(line) {
        return Some(number_prefix_pattern().replace(line, "").into_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::CourseHeadingExtractor;

    #[test]
    fn bold_titles_are_extracted_in_order() {
        let extractor = CourseHeadingExtractor::new();
        let response = "1. **Robotics**: intro to robots\n2. **AI Basics**: intro to AI";

        assert_eq!(extractor.extract(response), "Robotics\nAI Basics");
    }

    #[test]
    fn colon_lines_keep_text_before_first_colon() {
        let extractor = CourseHeadingExtractor::new();
        let response = "1. Celestial Voyages: explore space\n2. Young Coders: Python: basics";

        assert_eq!(extractor.extract(response), "Celestial Voyages\nYoung Coders");
    }

    #[test]
    fn plain_numbered_lines_keep_their_remainder() {
        let extractor = CourseHeadingExtractor::new();
        let response = "Our programs\n1. Drone Lab\n2.   3D Printing Studio\nAsk for details";

        assert_eq!(extractor.extract(response), "Drone Lab\n3D Printing Studio");
    }

    #[test]
    fn bold_title_wins_over_colon_rule() {
        let extractor = CourseHeadingExtractor::new();
        let response = "1. **Celestial Voyages (Space & Astronomy):** a journey through the stars";

        assert_eq!(extractor.extract(response), "Celestial Voyages (Space & Astronomy):");
    }

    #[test]
    fn response_without_titles_is_returned_unchanged() {
        let extractor = CourseHeadingExtractor::new();
        let response = "We run weekend workshops for all ages.";

        assert_eq!(extractor.extract(response), response);
    }

    #[test]
    fn empty_colon_prefix_is_skipped() {
        let extractor = CourseHeadingExtractor::new();
        let response = ": stray\n1. Electronics";

        assert_eq!(extractor.extract(response), "Electronics");
    }

    #[test]
    fn trigger_keywords_are_case_insensitive() {
        let extractor = CourseHeadingExtractor::new();

        assert!(extractor.is_triggered("What COURSES do you offer?"));
        assert!(extractor.is_triggered("Tell me about the lab program"));
        assert!(extractor.is_triggered("Which programs run in summer?"));
        assert!(!extractor.is_triggered("Where are you located?"));
    }

    #[test]
    fn apply_leaves_untriggered_queries_alone() {
        let extractor = CourseHeadingExtractor::new();
        let response = "1. **Robotics**: intro to robots";

        assert_eq!(extractor.apply(response, "Where are you?"), response);
        assert_eq!(extractor.apply(response, "Which courses?"), "Robotics");
    }
}
