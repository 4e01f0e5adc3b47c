//! Fallback answers and domain classification.
//!
//! The chatbot core only depends on [`FallbackProvider`]. [`KeywordFallback`]
//! is the bundled implementation: a topic table plus a domain vocabulary,
//! matched word by word with a character-bigram Dice similarity so small
//! spelling variants ("programme", "enrolment") still land on the right topic.

use std::collections::HashMap;

use crate::config::{DEFAULT_ORGANIZATION_NAME, DEFAULT_SIMILARITY_THRESHOLD};

const MODEL_BOILERPLATE: [&str; 5] = [
    "as an ai language model",
    "as an ai model",
    "i am an ai and",
    "my knowledge cutoff",
    "i do not have access to the internet",
];

const DOMAIN_VOCABULARY: [&str; 26] = [
    "learn",
    "learning",
    "study",
    "student",
    "students",
    "teacher",
    "teachers",
    "school",
    "education",
    "educational",
    "training",
    "lab",
    "labs",
    "tutor",
    "kids",
    "children",
    "certificate",
    "certification",
    "project",
    "projects",
    "skill",
    "skills",
    "lesson",
    "lessons",
    "mentor",
    "internship",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedResponse {
    pub text: String,
    pub used_fallback: bool,
}

pub trait FallbackProvider: Send + Sync {
    fn get_fallback_response(&self, query: &str) -> String;
    fn is_educational_query(&self, query: &str) -> bool;
    fn process_response(&self, response: &str, query: &str) -> ProcessedResponse;
    fn enhance_response(&self, response: &str, query: &str) -> String;
}

#[derive(Clone, Debug, PartialEq)]
pub struct FallbackTopic {
    pub name: String,
    pub keywords: Vec<String>,
    pub answer: String,
    pub follow_up: Option<String>,
}

impl FallbackTopic {
    fn new(name: &str, keywords: &[&str], answer: String, follow_up: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            answer,
            follow_up: follow_up.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug)]
pub struct KeywordFallback {
    organization_name: String,
    similarity_threshold: f64,
    topics: Vec<FallbackTopic>,
    vocabulary: Vec<String>,
}

impl KeywordFallback {
    pub fn new(organization_name: impl Into<String>, similarity_threshold: f64) -> Self {
        let organization_name = organization_name.into();
        let topics = default_topics(&organization_name);
        Self::with_topics(organization_name, similarity_threshold, topics)
    }

    pub fn with_topics(
        organization_name: impl Into<String>,
        similarity_threshold: f64,
        topics: Vec<FallbackTopic>,
    ) -> Self {
        let organization_name = organization_name.into();
        let mut vocabulary =
            DOMAIN_VOCABULARY.iter().map(|word| word.to_string()).collect::<Vec<_>>();
        vocabulary.extend(words(&organization_name));
        vocabulary.extend(topics.iter().flat_map(|topic| topic.keywords.iter().cloned()));
        vocabulary.sort();
        vocabulary.dedup();

        Self { organization_name, similarity_threshold, topics, vocabulary }
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn topics(&self) -> &[FallbackTopic] {
        &self.topics
    }

    /// Topic with the most query words matching one of its keywords.
    pub fn best_topic(&self, query: &str) -> Option<&FallbackTopic> {
        let query_words = words(query);
        let mut best: Option<(&FallbackTopic, usize)> = None;

        for topic in &self.topics {
            let score = query_words
                .iter()
                .filter(|word| {
                    topic.keywords.iter().any(|keyword| self.matches(word, keyword))
                })
                .count();
            if score > 0 && best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((topic, score));
            }
        }

        best.map(|(topic, _)| topic)
    }

    fn matches(&self, word: &str, keyword: &str) -> bool {
        word_similarity(word, keyword) >= self.similarity_threshold
    }

    fn generic_answer(&self) -> String {
        let org = &self.organization_name;
        format!(
            "I'm here to answer questions about {org}, such as our courses, lab programs, \
             enrollment, pricing, schedules and website. Could you ask me something about {org}?"
        )
    }
}

impl Default for KeywordFallback {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION_NAME, DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl FallbackProvider for KeywordFallback {
    fn get_fallback_response(&self, query: &str) -> String {
        match self.best_topic(query) {
            Some(topic) => topic.answer.clone(),
            None => self.generic_answer(),
        }
    }

    fn is_educational_query(&self, query: &str) -> bool {
        words(query)
            .iter()
            .any(|word| self.vocabulary.iter().any(|entry| self.matches(word, entry)))
    }

    fn process_response(&self, response: &str, query: &str) -> ProcessedResponse {
        let lowered = response.to_lowercase();
        let has_content = response.chars().any(char::is_alphanumeric);
        let boilerplate = MODEL_BOILERPLATE.iter().any(|phrase| lowered.contains(phrase));

        if !has_content || boilerplate {
            return ProcessedResponse {
                text: self.get_fallback_response(query),
                used_fallback: true,
            };
        }

        ProcessedResponse { text: response.to_string(), used_fallback: false }
    }

    fn enhance_response(&self, response: &str, query: &str) -> String {
        let follow_up = self.best_topic(query).and_then(|topic| topic.follow_up.as_deref());

        match follow_up {
            Some(follow_up) if !response.contains(follow_up) => {
                format!("{response}\n\n{follow_up}")
            }
            _ => response.to_string(),
        }
    }
}

fn default_topics(org: &str) -> Vec<FallbackTopic> {
    vec![
        FallbackTopic::new(
            "courses",
            &[
                "course", "courses", "program", "programs", "class", "classes", "curriculum",
                "subject", "robotics", "coding", "programming", "ai", "science", "stem",
                "astronomy", "electronics", "workshop", "workshops",
            ],
            format!(
                "{org} offers hands-on courses and lab programs in areas such as robotics, \
                 coding, artificial intelligence, electronics and space science. Ask me about a \
                 specific program or see the Courses page on our website for the full catalogue."
            ),
            Some("Would you like to know how to enroll in one of these programs?"),
        ),
        FallbackTopic::new(
            "enrollment",
            &[
                "enroll", "enrol", "enrollment", "register", "registration", "admission",
                "admissions", "signup", "apply", "application",
            ],
            format!(
                "You can enroll in {org} programs through the registration form on our website \
                 or by contacting our admissions team, who will help you pick the right batch."
            ),
            Some("I can also share pricing and schedule details if that helps."),
        ),
        FallbackTopic::new(
            "pricing",
            &[
                "price", "prices", "pricing", "fee", "fees", "cost", "costs", "payment",
                "discount", "scholarship",
            ],
            format!(
                "Fees depend on the program and batch you choose. Please check the Pricing \
                 section of the {org} website or contact our team for the current fee structure."
            ),
            None,
        ),
        FallbackTopic::new(
            "schedule",
            &[
                "schedule", "schedules", "timing", "timings", "batch", "batches", "duration",
                "weekend", "weekday", "session", "sessions",
            ],
            format!(
                "{org} runs weekday and weekend batches, and each program lists its duration \
                 and session timings on its course page. Our team can help you find a slot \
                 that fits."
            ),
            None,
        ),
        FallbackTopic::new(
            "company",
            &[
                "company", "founder", "founders", "mission", "vision", "history",
                "organization", "organisation",
            ],
            format!(
                "{org} is an education company focused on hands-on, future-ready learning \
                 through lab-based programs. You can read more about our mission and team on \
                 the About page of our website."
            ),
            None,
        ),
        FallbackTopic::new(
            "contact",
            &["contact", "email", "phone", "address", "location", "located", "support"],
            format!(
                "You can reach the {org} team through the Contact page on our website, where \
                 you'll find our email, phone number and address."
            ),
            None,
        ),
        FallbackTopic::new(
            "website",
            &["website", "site", "login", "account", "portal", "navigate", "navigation"],
            format!(
                "The {org} website has sections for Courses, Pricing, About and Contact. If \
                 you're having trouble with your account or login, our support team can help."
            ),
            None,
        ),
    ]
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sørensen-Dice coefficient over character bigrams. Words shorter than three
/// characters only match exactly.
pub fn word_similarity(left: &str, right: &str) -> f64 {
    if left == right {
        return 1.0;
    }
    if left.chars().count() < 3 || right.chars().count() < 3 {
        return 0.0;
    }

    let left_bigrams = bigrams(left);
    let right_bigrams = bigrams(right);
    let mut remaining = HashMap::new();
    for bigram in &right_bigrams {
        *remaining.entry(*bigram).or_insert(0usize) += 1;
    }

    let mut shared = 0usize;
    for bigram in &left_bigrams {
        if let Some(count) = remaining.get_mut(bigram) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2 * shared) as f64 / (left_bigrams.len() + right_bigrams.len()) as f64
}

fn bigrams(word: &str) -> Vec<(char, char)> {
    let chars = word.chars().collect::<Vec<_>>();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}
