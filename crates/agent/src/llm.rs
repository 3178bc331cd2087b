use anyhow::Result;
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw message content produced for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
