//! Playbook decision engine.
//!
//! The deterministic tier lives here. It reads only its arguments, so identical
//! inputs always produce identical results; the AI tier in `replydesk-agent`
//! falls back onto it.
//!
//! Every run records the playbook and the resolved order status, hands off to one
//! resolver per playbook and closes with a summary step. The user-authored rule
//! text is not interpreted; only the number of enabled rules is reported.

mod address_change;
mod cancel;
mod evidence;
mod wismo;

use serde_json::Value;

use crate::domain::order::{OrderRecord, STATUS_UNKNOWN};
use crate::domain::playbook::Playbook;
use crate::domain::policy::PolicyConfig;
use crate::domain::simulation::{CitationSource, SimulationResult, SimulationStatus};
use crate::errors::DomainError;

use self::evidence::Evidence;

/// Confidence reported by every deterministic decision.
pub const FALLBACK_CONFIDENCE: f64 = 0.35;

const UNKNOWN_PLAYBOOK_REPLY: &str = "I apologize, but I need to transfer you to a team member \
    who can better assist with your request.";

#[derive(Clone, Copy, Debug)]
pub struct DecisionInput<'a> {
    pub ticket_text: &'a str,
    pub playbook: &'a Playbook,
    pub policy: &'a PolicyConfig,
    /// Raw order JSON as supplied by the caller; `None` when no order was attached.
    pub order: Option<&'a Value>,
}

pub trait PlaybookEngine: Send + Sync {
    fn decide(&self, input: &DecisionInput<'_>) -> SimulationResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPlaybookEngine;

impl PlaybookEngine for DeterministicPlaybookEngine {
    fn decide(&self, input: &DecisionInput<'_>) -> SimulationResult {
        run_fallback(input).unwrap_or_else(|error| SimulationResult::error(error.to_string()))
    }
}

pub(crate) struct Resolution {
    reply: String,
    status: SimulationStatus,
}

impl Resolution {
    pub(crate) fn success(reply: impl Into<String>) -> Self {
        Self::with_status(reply, SimulationStatus::Success)
    }

    pub(crate) fn with_status(reply: impl Into<String>, status: SimulationStatus) -> Self {
        Self { reply: reply.into(), status }
    }
}

fn run_fallback(input: &DecisionInput<'_>) -> Result<SimulationResult, DomainError> {
    input.policy.validate_rules()?;

    let order = input.order.map(OrderRecord::from_value).unwrap_or_default();
    let mut evidence = Evidence::default();

    evidence.step(
        format!("Identified playbook: {}", input.playbook),
        format!("Using {}", input.policy.name),
    );

    let order_status = order.resolved_status(STATUS_UNKNOWN);
    evidence.step("Checked order status", format!("Order status: {order_status}"));
    if order.status.is_some() {
        evidence.cite(CitationSource::Order, "status", order_status);
    }

    let resolution = match input.playbook {
        Playbook::Wismo => wismo::resolve(&order, input.policy, &mut evidence),
        Playbook::Cancel => cancel::resolve(&order, &mut evidence),
        Playbook::AddressChange => address_change::resolve(&order, &mut evidence),
        Playbook::Unknown(_) => {
            Resolution::with_status(UNKNOWN_PLAYBOOK_REPLY, SimulationStatus::Handoff)
        }
    };

    evidence.step(
        "Generated response",
        format!("Status: {}, Confidence: {FALLBACK_CONFIDENCE}", resolution.status),
    );

    Ok(evidence.finish(resolution.reply, resolution.status, FALLBACK_CONFIDENCE))
}
