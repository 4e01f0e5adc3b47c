use anyhow::Result;
use async_trait::async_trait;

/// External knowledge-retrieval agent.
///
/// `respond` returns whatever text the agent produced for the query, which may
/// still carry console formatting and echoes; callers sanitize it.
#[async_trait]
pub trait KnowledgeAgent: Send + Sync {
    async fn respond(&self, query: &str, instructions: &str) -> Result<String>;

    /// Forget any conversation history held for follow-up questions.
    async fn reset(&self) -> Result<()> {
        Ok(())
    }
}
