use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use labbot_core::config::{AgentConfig, AgentProvider};
use labbot_core::sanitize_agent_output;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::conversation::{ChatMessage, ConversationHistory};
use crate::llm::KnowledgeAgent;

/// [`KnowledgeAgent`] reached over HTTP.
///
/// Ollama and OpenAI-compatible providers receive the instructions as a system
/// message followed by the conversation so far. An agent service receives the
/// query, instructions and history as JSON and answers with its raw output.
pub struct HttpKnowledgeAgent {
    client: Client,
    provider: AgentProvider,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    history: Mutex<ConversationHistory>,
}

impl HttpKnowledgeAgent {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build agent http client")?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            history: Mutex::new(ConversationHistory::new(config.history_turns)),
        })
    }

    pub fn endpoint(&self) -> String {
        let path = match self.provider {
            AgentProvider::Ollama => "/api/chat",
            AgentProvider::OpenAi => "/v1/chat/completions",
            AgentProvider::AgentService => "/query",
        };
        format!("{}{path}", self.base_url)
    }

    pub fn build_payload(&self, query: &str, instructions: &str, history: &[ChatMessage]) -> Value {
        match self.provider {
            AgentProvider::AgentService => json!({
                "query": query,
                "instructions": instructions,
                "history": history,
            }),
            AgentProvider::Ollama | AgentProvider::OpenAi => {
                let mut messages = Vec::with_capacity(history.len() + 2);
                messages.push(ChatMessage::system(instructions));
                messages.extend_from_slice(history);
                messages.push(ChatMessage::user(query));

                let mut payload = json!({ "model": self.model, "messages": messages });
                if self.provider == AgentProvider::Ollama {
                    payload["stream"] = Value::Bool(false);
                }
                payload
            }
        }
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Stores the sanitized answer so console noise is never replayed to the agent.
    async fn record_turn(&self, query: &str, output: &str) {
        let answer = sanitize_agent_output(output, query);
        if answer.is_empty() {
            debug!(event_name = "agent.history.skipped", "agent output had no answer text");
            return;
        }
        self.history.lock().await.record(query, &answer);
    }
}

#[async_trait]
impl KnowledgeAgent for HttpKnowledgeAgent {
    async fn respond(&self, query: &str, instructions: &str) -> Result<String> {
        let history = self.history.lock().await.messages();
        let payload = self.build_payload(query, instructions, &history);
        let endpoint = self.endpoint();

        debug!(
            event_name = "agent.request.start",
            endpoint = %endpoint,
            history_messages = history.len(),
            "sending query to agent"
        );

        let mut request = self.client.post(&endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.context("agent request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("agent endpoint returned {status}: {}", body.trim());
        }

        let body: Value = response.json().await.context("failed to decode agent response")?;
        let output = extract_output(self.provider, &body)?;
        self.record_turn(query, &output).await;

        Ok(output)
    }

    async fn reset(&self) -> Result<()> {
        self.history.lock().await.clear();
        Ok(())
    }
}

pub fn extract_output(provider: AgentProvider, body: &Value) -> Result<String> {
    let output = match provider {
        AgentProvider::Ollama => body.pointer("/message/content"),
        AgentProvider::OpenAi => body.pointer("/choices/0/message/content"),
        AgentProvider::AgentService => body.get("output").or_else(|| body.get("response")),
    };

    output
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("agent response did not contain output text"))
}

#[cfg(test)]
mod tests {
    use labbot_core::config::{AgentConfig, AgentProvider};
    use serde_json::json;

    use super::{extract_output, HttpKnowledgeAgent};
    use crate::conversation::ChatMessage;
    use crate::llm::KnowledgeAgent;

    fn agent(provider: AgentProvider) -> HttpKnowledgeAgent {
        HttpKnowledgeAgent::from_config(&AgentConfig {
            provider,
            base_url: "http://localhost:11434/".to_string(),
            api_key: None,
            model: "llama3.1".to_string(),
            timeout_secs: 5,
            history_turns: 4,
        })
        .expect("client should build")
    }

    #[test]
    fn endpoints_follow_provider_conventions() {
        assert_eq!(agent(AgentProvider::Ollama).endpoint(), "http://localhost:11434/api/chat");
        assert_eq!(
            agent(AgentProvider::OpenAi).endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(agent(AgentProvider::AgentService).endpoint(), "http://localhost:11434/query");
    }

    #[test]
    fn chat_payload_puts_instructions_first_and_query_last() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello!")];
        let payload =
            agent(AgentProvider::Ollama).build_payload("courses?", "be helpful", &history);

        assert_eq!(payload["model"], "llama3.1");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["messages"][0], json!({"role": "system", "content": "be helpful"}));
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["messages"][3], json!({"role": "user", "content": "courses?"}));
    }

    #[test]
    fn openai_payload_has_no_stream_flag() {
        let payload = agent(AgentProvider::OpenAi).build_payload("q", "i", &[]);
        assert!(payload.get("stream").is_none());
        assert_eq!(payload["messages"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn agent_service_payload_carries_query_and_instructions() {
        let payload = agent(AgentProvider::AgentService).build_payload("q", "i", &[]);
        assert_eq!(payload, json!({"query": "q", "instructions": "i", "history": []}));
    }

    #[test]
    fn output_is_read_from_provider_specific_fields() {
        let ollama = json!({"message": {"role": "assistant", "content": "from ollama"}});
        let openai = json!({"choices": [{"message": {"content": "from openai"}}]});
        let service = json!({"output": "\u{1b}[1mraw console\u{1b}[0m"});
        let legacy = json!({"response": "legacy field"});

        assert_eq!(
            extract_output(AgentProvider::Ollama, &ollama).ok().as_deref(),
            Some("from ollama")
        );
        assert_eq!(
            extract_output(AgentProvider::OpenAi, &openai).ok().as_deref(),
            Some("from openai")
        );
        assert_eq!(
            extract_output(AgentProvider::AgentService, &service).ok().as_deref(),
            Some("\u{1b}[1mraw console\u{1b}[0m")
        );
        assert_eq!(
            extract_output(AgentProvider::AgentService, &legacy).ok().as_deref(),
            Some("legacy field")
        );
    }

    #[test]
    fn missing_output_is_an_error() {
        let error = extract_output(AgentProvider::OpenAi, &json!({"choices": []}))
            .expect_err("empty choices should fail");
        assert!(error.to_string().contains("did not contain output text"));
    }

    #[tokio::test]
    async fn history_keeps_the_sanitized_answer_only() {
        let agent = agent(AgentProvider::AgentService);

        let raw = "\u{1b}[1mcourses?\u{1b}[0m\nINFO retrieved 3 docs\nWe offer Robotics.";

        agent.record_turn("courses?", raw).await;
        agent.record_turn("hours?", "\u{1b}[2K\nDEBUG nothing found\n").await;

        let messages = agent.history.lock().await.messages();
        let contents = messages.iter().map(|message| message.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, vec!["courses?", "We offer Robotics."]);
        assert_eq!(agent.history_len().await, 1);
    }

    #[tokio::test]
    async fn unreachable_agent_reports_an_error_and_keeps_history_empty() {
        let agent = HttpKnowledgeAgent::from_config(&AgentConfig {
            provider: AgentProvider::Ollama,
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            model: "llama3.1".to_string(),
            timeout_secs: 2,
            history_turns: 4,
        })
        .expect("client should build");

        let result = agent.respond("courses?", "be helpful").await;

        assert!(result.is_err());
        assert_eq!(agent.history_len().await, 0);
    }
}
