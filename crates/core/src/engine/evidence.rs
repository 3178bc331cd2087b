use crate::domain::playbook::PolicyType;
use crate::domain::simulation::{
    Citation, CitationSource, SimulationResult, SimulationStatus, TraceStep,
};

/// Citations and trace steps gathered while a playbook runs.
///
/// Step numbers are assigned here so resolvers cannot leave gaps.
#[derive(Debug, Default)]
pub(crate) struct Evidence {
    citations: Vec<Citation>,
    trace: Vec<TraceStep>,
}

impl Evidence {
    pub(crate) fn step(&mut self, action: impl Into<String>, result: impl Into<String>) {
        let step = self.trace.len() as u32 + 1;
        self.trace.push(TraceStep { step, action: action.into(), result: result.into() });
    }

    pub(crate) fn cite(
        &mut self,
        source: CitationSource,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.citations.push(Citation { source, field: field.into(), value: value.into() });
    }

    pub(crate) fn cite_policy_type(&mut self, policy_type: PolicyType) {
        self.cite(CitationSource::Policy, "type", policy_type.as_str());
    }

    pub(crate) fn finish(
        self,
        suggested_reply: String,
        status: SimulationStatus,
        confidence: f64,
    ) -> SimulationResult {
        SimulationResult {
            suggested_reply,
            confidence,
            citations: self.citations,
            trace: self.trace,
            status,
        }
    }
}
