use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use labbot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path };

    let api_key = match &config.agent.api_key {
        Some(key) => redact_secret(key.expose_secret()),
        None => "<unset>".to_string(),
    };

    let entries: [(&str, String, &[&str]); 15] = [
        (
            "agent.provider",
            config.agent.provider.as_str().to_string(),
            &["LABBOT_AGENT_PROVIDER"],
        ),
        ("agent.base_url", config.agent.base_url.clone(), &["LABBOT_AGENT_BASE_URL"]),
        ("agent.api_key", api_key, &["LABBOT_AGENT_API_KEY"]),
        ("agent.model", config.agent.model.clone(), &["LABBOT_AGENT_MODEL"]),
        (
            "agent.timeout_secs",
            config.agent.timeout_secs.to_string(),
            &["LABBOT_AGENT_TIMEOUT_SECS"],
        ),
        (
            "agent.history_turns",
            config.agent.history_turns.to_string(),
            &["LABBOT_AGENT_HISTORY_TURNS"],
        ),
        (
            "chatbot.organization_name",
            config.chatbot.organization_name.clone(),
            &["LABBOT_CHATBOT_ORGANIZATION_NAME"],
        ),
        (
            "chatbot.similarity_threshold",
            config.chatbot.similarity_threshold.to_string(),
            &["LABBOT_CHATBOT_SIMILARITY_THRESHOLD"],
        ),
        (
            "chatbot.min_response_chars",
            config.chatbot.min_response_chars.to_string(),
            &["LABBOT_CHATBOT_MIN_RESPONSE_CHARS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["LABBOT_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["LABBOT_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["LABBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["LABBOT_LOGGING_LEVEL", "LABBOT_LOG_LEVEL"],
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["LABBOT_LOGGING_FORMAT", "LABBOT_LOG_FORMAT"],
        ),
        (
            "config.file",
            sources
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
            &[],
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|(key, value, env_keys)| {
        render_line(key, value, sources.field_source(key, env_keys))
    }));

    CommandResult::plain(lines.join("\n"))
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<PathBuf>,
}

impl SourceLookup<'_> {
    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_keep_only_their_prefix() {
        assert_eq!(redact_secret("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_secret("abcdef"), "<redacted>");
        assert_eq!(redact_secret("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc = "[agent]\nmodel = \"llama3.1\"\n".parse::<toml::Value>().expect("toml");

        assert!(contains_path(&doc, "agent.model"));
        assert!(!contains_path(&doc, "agent.base_url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
