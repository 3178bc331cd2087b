//! Turns raw model output into a well-formed `SimulationResult`.
//!
//! Every field is defended on its own: a bad `citations` array does not discard a
//! usable reply. Only output that is not JSON at all is rejected.

use replydesk_core::domain::simulation::{
    Citation, CitationSource, SimulationResult, SimulationStatus, TraceStep,
};
use serde_json::{Map, Value};

pub const MISSING_REPLY: &str = "Unable to generate response";
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub fn normalize_response(raw: &str) -> Result<SimulationResult, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);

    let suggested_reply = fields
        .get("suggested_reply")
        .and_then(Value::as_str)
        .filter(|reply| !reply.is_empty())
        .unwrap_or(MISSING_REPLY)
        .to_string();

    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|confidence| confidence.is_finite())
        .map(|confidence| confidence.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let status = fields
        .get("status")
        .and_then(Value::as_str)
        .and_then(SimulationStatus::parse)
        .unwrap_or(SimulationStatus::Success);

    let citations = elements(fields, "citations").filter_map(citation).collect();

    let mut trace: Vec<TraceStep> = elements(fields, "trace")
        .filter_map(trace_step)
        .enumerate()
        .map(|(index, (action, result))| TraceStep { step: index as u32 + 1, action, result })
        .collect();
    if trace.is_empty() {
        trace.push(TraceStep {
            step: 1,
            action: "Generated response via AI model".to_string(),
            result: format!("Status: {status}, Confidence: {confidence}"),
        });
    }

    Ok(SimulationResult { suggested_reply, confidence, citations, trace, status })
}

fn elements<'a>(fields: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    fields.get(key).and_then(Value::as_array).into_iter().flatten()
}

fn citation(value: &Value) -> Option<Citation> {
    let source = match value.get("source")?.as_str()?.trim().to_ascii_lowercase().as_str() {
        "policy" => CitationSource::Policy,
        "order" => CitationSource::Order,
        _ => return None,
    };
    let field = value.get("field")?.as_str()?.to_string();
    let value = scalar_text(value.get("value")?)?;

    Some(Citation { source, field, value })
}

fn trace_step(value: &Value) -> Option<(String, String)> {
    let action = value.get("action")?.as_str()?.to_string();
    let result = value.get("result").and_then(scalar_text).unwrap_or_default();
    Some((action, result))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
