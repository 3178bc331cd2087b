use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use replydesk_core::config::LlmConfig;
use replydesk_core::domain::simulation::SimulationResult;
use replydesk_core::engine::{DecisionInput, DeterministicPlaybookEngine, PlaybookEngine};
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::normalize::normalize_response;
use crate::openai::{LlmError, OpenAiClient};
use crate::prompt::build_request;

const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct PlaybookRuntime {
    llm: Option<Arc<dyn LlmClient>>,
    engine: Arc<dyn PlaybookEngine>,
    timeout: Duration,
}

impl Default for PlaybookRuntime {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl PlaybookRuntime {
    pub fn deterministic() -> Self {
        Self { llm: None, engine: Arc::new(DeterministicPlaybookEngine), timeout: DEFAULT_AI_TIMEOUT }
    }

    pub fn with_llm(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm: Some(llm), ..Self::deterministic() }.with_timeout(timeout)
    }

    /// Builds the runtime for `config`; a disabled provider yields the deterministic tier.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.is_configured() {
            return Ok(Self::deterministic());
        }

        let client = OpenAiClient::from_config(config)?;
        Ok(Self::with_llm(Arc::new(client), Duration::from_secs(config.timeout_secs)))
    }

    pub fn with_engine(mut self, engine: Arc<dyn PlaybookEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ai_configured(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn decide(&self, input: &DecisionInput<'_>, correlation_id: &str) -> SimulationResult {
        let playbook = input.playbook.as_str();

        // A policy the engine would reject is never sent to the model.
        if let (Some(llm), Ok(())) = (&self.llm, input.policy.validate_rules()) {
            info!(
                event_name = "runtime.ai.requested",
                correlation_id,
                playbook,
                "delegating playbook decision to llm"
            );

            match self.decide_with_llm(llm.as_ref(), input).await {
                Ok(result) => {
                    info!(
                        event_name = "runtime.ai.completed",
                        correlation_id,
                        playbook,
                        status = result.status.as_str(),
                        confidence = result.confidence,
                        "llm decision accepted"
                    );
                    return result;
                }
                Err(error) => {
                    warn!(
                        event_name = "runtime.ai.fallback",
                        correlation_id,
                        playbook,
                        error = %error,
                        "llm decision failed; using deterministic engine"
                    );
                }
            }
        }

        let result = self.engine.decide(input);
        info!(
            event_name = "runtime.deterministic.completed",
            correlation_id,
            playbook,
            status = result.status.as_str(),
            "deterministic decision produced"
        );
        result
    }

    async fn decide_with_llm(
        &self,
        llm: &dyn LlmClient,
        input: &DecisionInput<'_>,
    ) -> Result<SimulationResult> {
        let request = build_request(input)?;
        let raw = tokio::time::timeout(self.timeout, llm.complete(&request))
            .await
            .map_err(|_| anyhow!("llm call timed out after {}ms", self.timeout.as_millis()))??;

        Ok(normalize_response(&raw)?)
    }
}
