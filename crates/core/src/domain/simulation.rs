use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::playbook::Playbook;

pub const ERROR_REPLY: &str = "An error occurred while processing your request.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Success,
    Handoff,
    Blocked,
    Error,
}

impl SimulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Handoff => "handoff",
            Self::Blocked => "blocked",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "handoff" => Some(Self::Handoff),
            "blocked" => Some(Self::Blocked),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationSource {
    Policy,
    Order,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: CitationSource,
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: u32,
    pub action: String,
    pub result: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub suggested_reply: String,
    pub confidence: f64,
    pub citations: Vec<Citation>,
    pub trace: Vec<TraceStep>,
    pub status: SimulationStatus,
}

impl SimulationResult {
    /// Well-formed result for a fault that stopped the engine before it could decide.
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            suggested_reply: ERROR_REPLY.to_string(),
            confidence: 0.0,
            citations: Vec::new(),
            trace: vec![TraceStep {
                step: 1,
                action: "Error".to_string(),
                result: description.into(),
            }],
            status: SimulationStatus::Error,
        }
    }

    /// Steps are 1-based and gap-free, and there is at least one.
    pub fn has_well_formed_trace(&self) -> bool {
        !self.trace.is_empty()
            && self.trace.iter().enumerate().all(|(index, step)| step.step as usize == index + 1)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLog {
    pub id: String,
    pub playbook: Playbook,
    pub ticket_text: String,
    #[serde(default)]
    pub order_json: Option<Value>,
    pub result: SimulationResult,
    pub created_at: DateTime<Utc>,
}

impl SimulationLog {
    pub fn new(
        playbook: Playbook,
        ticket_text: impl Into<String>,
        order_json: Option<Value>,
        result: SimulationResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("log-{}", Uuid::new_v4()),
            playbook,
            ticket_text: ticket_text.into(),
            order_json,
            result,
            created_at,
        }
    }
}
