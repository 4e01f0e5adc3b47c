use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use labbot_core::config::AppConfig;
use labbot_core::{
    ApplicationError, CourseHeadingExtractor, FallbackProvider, KeywordFallback, ResponseCleaner,
    SanitizePipeline, SystemPrompt,
};
use tracing::{info, warn};

use crate::client::HttpKnowledgeAgent;
use crate::guardrails::{RelevanceGate, ScopeGate};
use crate::llm::KnowledgeAgent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyRoute {
    Agent,
    EmptyQuery,
    OutOfScope,
    Irrelevant,
    ProcessedFallback,
    Error,
}

impl ReplyRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::EmptyQuery => "empty_query",
            Self::OutOfScope => "out_of_scope",
            Self::Irrelevant => "irrelevant",
            Self::ProcessedFallback => "processed_fallback",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub route: ReplyRoute,
}

impl ChatReply {
    fn new(text: impl Into<String>, route: ReplyRoute) -> Self {
        Self { text: text.into(), route }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(
            self.route,
            ReplyRoute::OutOfScope | ReplyRoute::Irrelevant | ReplyRoute::ProcessedFallback
        )
    }
}

/// Answers one user message: scope check, agent call, cleanup, relevance check
/// and fallback substitution.
///
/// The runtime starts out not ready. [`ChatbotRuntime::initialize`] must be
/// called before [`ChatbotRuntime::respond`] accepts messages, and
/// [`ChatbotRuntime::shutdown`] puts it back into the unavailable state.
pub struct ChatbotRuntime {
    agent: Arc<dyn KnowledgeAgent>,
    fallback: Arc<dyn FallbackProvider>,
    prompt: SystemPrompt,
    instructions: String,
    sanitizer: SanitizePipeline,
    cleaner: ResponseCleaner,
    extractor: CourseHeadingExtractor,
    scope_gate: ScopeGate,
    relevance_gate: RelevanceGate,
    ready: AtomicBool,
}

impl ChatbotRuntime {
    pub fn new(
        agent: Arc<dyn KnowledgeAgent>,
        fallback: Arc<dyn FallbackProvider>,
        prompt: SystemPrompt,
    ) -> Self {
        let instructions = prompt.render_instructions();
        let cleaner = ResponseCleaner::new(prompt.short_response_prompt());

        Self {
            agent,
            fallback,
            prompt,
            instructions,
            sanitizer: SanitizePipeline::agent_output(),
            cleaner,
            extractor: CourseHeadingExtractor::new(),
            scope_gate: ScopeGate::new(),
            relevance_gate: RelevanceGate::default(),
            ready: AtomicBool::new(false),
        }
    }

    pub fn with_relevance_gate(mut self, relevance_gate: RelevanceGate) -> Self {
        self.relevance_gate = relevance_gate;
        self
    }

    pub fn with_scope_gate(mut self, scope_gate: ScopeGate) -> Self {
        self.scope_gate = scope_gate;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let agent = HttpKnowledgeAgent::from_config(&config.agent)
            .map_err(|error| ApplicationError::Configuration(format!("{error:#}")))?;
        let chatbot = &config.chatbot;
        let fallback =
            KeywordFallback::new(&chatbot.organization_name, chatbot.similarity_threshold);

        Ok(Self::new(
            Arc::new(agent),
            Arc::new(fallback),
            SystemPrompt::new(&chatbot.organization_name),
        )
        .with_relevance_gate(RelevanceGate::new(chatbot.min_response_chars)))
    }

    pub fn prompt(&self) -> &SystemPrompt {
        &self.prompt
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn initialize(&self) {
        self.ready.store(true, Ordering::Release);
        info!(
            event_name = "chatbot.runtime.initialized",
            organization = %self.prompt.organization_name(),
            stages = ?self.sanitizer.stage_names(),
            "chatbot runtime ready"
        );
    }

    pub async fn shutdown(&self) {
        self.ready.store(false, Ordering::Release);
        if let Err(error) = self.agent.reset().await {
            warn!(
                event_name = "chatbot.runtime.reset_failed",
                error = %error,
                "failed to reset agent conversation during shutdown"
            );
        }
        info!(event_name = "chatbot.runtime.shutdown", "chatbot runtime stopped");
    }

    pub async fn respond(
        &self,
        message: &str,
        correlation_id: &str,
    ) -> Result<ChatReply, ApplicationError> {
        if !self.is_ready() {
            return Err(ApplicationError::Unavailable("chatbot is not initialized".to_string()));
        }

        let reply = self.answer(message.trim(), correlation_id).await;
        info!(
            event_name = "chat.reply.completed",
            correlation_id = %correlation_id,
            route = reply.route.as_str(),
            reply_chars = reply.text.chars().count(),
            "chat reply produced"
        );
        Ok(reply)
    }

    async fn answer(&self, query: &str, correlation_id: &str) -> ChatReply {
        if query.is_empty() {
            return ChatReply::new(self.prompt.empty_query_message(), ReplyRoute::EmptyQuery);
        }

        let scope = self.scope_gate.evaluate(query, self.fallback.as_ref());
        if !scope.is_allowed() {
            info!(
                event_name = "chat.scope.rejected",
                correlation_id = %correlation_id,
                reason_code = scope.reason_code().unwrap_or_default(),
                "query outside supported domain"
            );
            return ChatReply::new(
                self.fallback.get_fallback_response(query),
                ReplyRoute::OutOfScope,
            );
        }

        let raw = match self.agent.respond(query, &self.instructions).await {
            Ok(raw) => raw,
            Err(error) => {
                let failure = ApplicationError::Agent(format!("{error:#}"));
                warn!(
                    event_name = "chat.agent.failed",
                    correlation_id = %correlation_id,
                    error = %failure,
                    "agent call failed"
                );
                return ChatReply::new(self.prompt.error_message(), ReplyRoute::Error);
            }
        };

        let sanitized = self.sanitizer.run(&raw, query);
        let cleaned = self.cleaner.clean(&sanitized, query);
        let extracted = self.extractor.apply(&cleaned, query);

        let relevance = self.relevance_gate.evaluate(&extracted);
        if !relevance.is_allowed() {
            info!(
                event_name = "chat.relevance.rejected",
                correlation_id = %correlation_id,
                reason_code = relevance.reason_code().unwrap_or_default(),
                "agent answer replaced by fallback"
            );
            return ChatReply::new(
                self.fallback.get_fallback_response(query),
                ReplyRoute::Irrelevant,
            );
        }

        let processed = self.fallback.process_response(&extracted, query);
        if processed.used_fallback {
            return ChatReply::new(processed.text, ReplyRoute::ProcessedFallback);
        }

        ChatReply::new(self.fallback.enhance_response(&processed.text, query), ReplyRoute::Agent)
    }
}
