use crate::config::DEFAULT_ORGANIZATION_NAME;

const HELP_TOPICS: [&str; 5] = [
    "Information about {org} courses and programs",
    "Company details and background",
    "Enrollment and registration information",
    "Website navigation and support",
    "Pricing and schedule details",
];

/// Persona, formatting rules and the fixed user-facing messages of the assistant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemPrompt {
    organization_name: String,
}

impl SystemPrompt {
    pub fn new(organization_name: impl Into<String>) -> Self {
        Self { organization_name: organization_name.into() }
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn full_system_prompt(&self) -> String {
        let org = &self.organization_name;
        format!(
            "You are the official learning assistant for {org}.\n\
             Answer questions about {org} courses, lab programs, enrollment, pricing, schedules, \
             the company and its website, using only the knowledge base provided to you.\n\
             If the knowledge base does not cover a question, say so briefly instead of guessing.\n\
             Keep answers short, friendly and factual. Do not discuss topics unrelated to {org} \
             or education."
        )
    }

    /// Instructions sent with every agent call.
    pub fn render_instructions(&self) -> String {
        format!(
            "{}\n\n\
             Additional instructions:\n\
             - When listing courses or programs, provide only the course titles as a numbered list.\n\
             - Do NOT include any descriptions or extra details after the titles.\n\
             - Each course title should be on a separate line starting with its number.\n\
             - Avoid repeating the user's question in the answer.\n",
            self.full_system_prompt()
        )
    }

    pub fn error_message(&self) -> String {
        "I'm sorry, I ran into a problem while answering that. Please try again in a moment."
            .to_string()
    }

    pub fn greeting(&self) -> String {
        format!(
            "Hello! I'm your {} learning assistant. How can I help you today? 📚",
            self.organization_name
        )
    }

    pub fn short_response_prompt(&self) -> String {
        format!(
            "I'm here to help you with {} information. What would you like to know?",
            self.organization_name
        )
    }

    pub fn empty_query_message(&self) -> String {
        format!("Please ask me something about {}!", self.organization_name)
    }

    pub fn farewell(&self) -> String {
        format!("Thank you for using {} chatbot. Goodbye! 👋", self.organization_name)
    }

    pub fn help_text(&self) -> String {
        let mut lines = vec!["I can help you with:".to_string()];
        lines.extend(
            HELP_TOPICS
                .iter()
                .map(|topic| format!("• {}", topic.replace("{org}", &self.organization_name))),
        );
        lines.join("\n")
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION_NAME)
    }
}
