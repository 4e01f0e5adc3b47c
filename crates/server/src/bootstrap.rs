use std::sync::Arc;

use labbot_agent::ChatbotRuntime;
use labbot_core::config::{AppConfig, ConfigError, LoadOptions};
use labbot_core::ApplicationError;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<ChatbotRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("chatbot runtime construction failed: {0}")]
    Runtime(#[from] ApplicationError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let runtime = ChatbotRuntime::from_config(&config)?;
    runtime.initialize();
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        agent_provider = config.agent.provider.as_str(),
        agent_base_url = %config.agent.base_url,
        "chatbot runtime initialized"
    );

    Ok(Application { config, runtime: Arc::new(runtime) })
}
