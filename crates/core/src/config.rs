use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub chatbot: ChatbotConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub provider: AgentProvider,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
    pub history_turns: usize,
}

#[derive(Clone, Debug)]
pub struct ChatbotConfig {
    pub organization_name: String,
    pub similarity_threshold: f64,
    pub min_response_chars: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentProvider {
    Ollama,
    #[serde(alias = "openai")]
    OpenAi,
    AgentService,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub agent_provider: Option<AgentProvider>,
    pub agent_base_url: Option<String>,
    pub agent_model: Option<String>,
    pub organization_name: Option<String>,
    pub similarity_threshold: Option<f64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_ORGANIZATION_NAME: &str = "Lab of Future";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MIN_RESPONSE_CHARS: usize = 10;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig {
                provider: AgentProvider::Ollama,
                base_url: "http://localhost:11434".to_string(),
                api_key: None,
                model: "llama3.1".to_string(),
                timeout_secs: 60,
                history_turns: 10,
            },
            chatbot: ChatbotConfig {
                organization_name: DEFAULT_ORGANIZATION_NAME.to_string(),
                similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
                min_response_chars: DEFAULT_MIN_RESPONSE_CHARS,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for AgentProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "agent_service" | "agent-service" => Ok(Self::AgentService),
            other => Err(ConfigError::Validation(format!(
                "unsupported agent provider `{other}` (expected ollama|openai|agent_service)"
            ))),
        }
    }
}

impl AgentProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::AgentService => "agent_service",
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("labbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(agent) = patch.agent {
            if let Some(provider) = agent.provider {
                self.agent.provider = provider;
            }
            if let Some(base_url) = agent.base_url {
                self.agent.base_url = base_url;
            }
            if let Some(api_key) = agent.api_key {
                self.agent.api_key = Some(api_key.into());
            }
            if let Some(model) = agent.model {
                self.agent.model = model;
            }
            if let Some(timeout_secs) = agent.timeout_secs {
                self.agent.timeout_secs = timeout_secs;
            }
            if let Some(history_turns) = agent.history_turns {
                self.agent.history_turns = history_turns;
            }
        }

        if let Some(chatbot) = patch.chatbot {
            if let Some(organization_name) = chatbot.organization_name {
                self.chatbot.organization_name = organization_name;
            }
            if let Some(similarity_threshold) = chatbot.similarity_threshold {
                self.chatbot.similarity_threshold = similarity_threshold;
            }
            if let Some(min_response_chars) = chatbot.min_response_chars {
                self.chatbot.min_response_chars = min_response_chars;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LABBOT_AGENT_PROVIDER") {
            self.agent.provider = value.parse()?;
        }
        if let Some(value) = read_env("LABBOT_AGENT_BASE_URL") {
            self.agent.base_url = value;
        }
        if let Some(value) = read_env("LABBOT_AGENT_API_KEY") {
            self.agent.api_key = Some(value.into());
        }
        if let Some(value) = read_env("LABBOT_AGENT_MODEL") {
            self.agent.model = value;
        }
        if let Some(value) = read_env("LABBOT_AGENT_TIMEOUT_SECS") {
            self.agent.timeout_secs = parse_u64("LABBOT_AGENT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("LABBOT_AGENT_HISTORY_TURNS") {
            self.agent.history_turns = parse_usize("LABBOT_AGENT_HISTORY_TURNS", &value)?;
        }

        if let Some(value) = read_env("LABBOT_CHATBOT_ORGANIZATION_NAME") {
            self.chatbot.organization_name = value;
        }
        if let Some(value) = read_env("LABBOT_CHATBOT_SIMILARITY_THRESHOLD") {
            self.chatbot.similarity_threshold =
                parse_f64("LABBOT_CHATBOT_SIMILARITY_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("LABBOT_CHATBOT_MIN_RESPONSE_CHARS") {
            self.chatbot.min_response_chars =
                parse_usize("LABBOT_CHATBOT_MIN_RESPONSE_CHARS", &value)?;
        }

        if let Some(value) = read_env("LABBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LABBOT_SERVER_PORT") {
            self.server.port = parse_u16("LABBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("LABBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("LABBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("LABBOT_LOGGING_LEVEL").or_else(|| read_env("LABBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LABBOT_LOGGING_FORMAT").or_else(|| read_env("LABBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(provider) = overrides.agent_provider {
            self.agent.provider = provider;
        }
        if let Some(base_url) = overrides.agent_base_url {
            self.agent.base_url = base_url;
        }
        if let Some(model) = overrides.agent_model {
            self.agent.model = model;
        }
        if let Some(organization_name) = overrides.organization_name {
            self.chatbot.organization_name = organization_name;
        }
        if let Some(similarity_threshold) = overrides.similarity_threshold {
            self.chatbot.similarity_threshold = similarity_threshold;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_agent(&self.agent)?;
        validate_chatbot(&self.chatbot)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("labbot.toml"), PathBuf::from("config/labbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    let base_url = agent.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "agent.base_url must start with http:// or https://".to_string(),
        ));
    }

    if agent.timeout_secs == 0 || agent.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "agent.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if agent.provider != AgentProvider::AgentService && agent.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "agent.model is required for ollama/openai providers".to_string(),
        ));
    }

    if agent.provider == AgentProvider::OpenAi {
        let missing = agent
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "agent.api_key is required for the openai provider".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_chatbot(chatbot: &ChatbotConfig) -> Result<(), ConfigError> {
    if chatbot.organization_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "chatbot.organization_name must not be empty".to_string(),
        ));
    }

    let threshold = chatbot.similarity_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ConfigError::Validation(
            "chatbot.similarity_threshold must be in range (0, 1]".to_string(),
        ));
    }

    if chatbot.min_response_chars == 0 {
        return Err(ConfigError::Validation(
            "chatbot.min_response_chars must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    agent: Option<AgentPatch>,
    chatbot: Option<ChatbotPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    provider: Option<AgentProvider>,
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    history_turns: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatbotPatch {
    organization_name: Option<String>,
    similarity_threshold: Option<f64>,
    min_response_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
