use replydesk_core::engine::DecisionInput;

use crate::llm::CompletionRequest;

pub const NO_ORDER_NOTE: &str = "No order data provided - using policy rules only.";

const INSTRUCTIONS: &str = "You are a support automation assistant for Shopify brands. Your job \
is to analyze customer support tickets and generate appropriate responses based on company \
policies.

IMPORTANT RULES:
1. Only use information from the provided policy and order data
2. Always cite the specific policy rules and order fields you used
3. Be helpful and empathetic to customers
4. If you cannot confidently handle the request, recommend handoff to a human agent
5. Never make up information - only use what's provided";

const RESPONSE_SHAPE: &str = r#"Respond in JSON format:
{
  "suggested_reply": "Your response to the customer",
  "confidence": 0.0 to 1.0,
  "citations": [{"source": "policy|order", "field": "field name", "value": "actual value used"}],
  "trace": [{"step": 1, "action": "what you checked", "result": "what you found"}],
  "status": "success|handoff|blocked|error"
}"#;

pub fn build_request(input: &DecisionInput<'_>) -> Result<CompletionRequest, serde_json::Error> {
    let policy = serde_json::to_string_pretty(input.policy)?;
    let order = match input.order {
        Some(order) => format!("Order data:\n{}", serde_json::to_string_pretty(order)?),
        None => NO_ORDER_NOTE.to_string(),
    };

    let system = format!("{INSTRUCTIONS}\n\nPolicy being used:\n{policy}\n\n{order}\n\n{RESPONSE_SHAPE}");
    let user = format!("Customer ticket:\n{}\n\nPlaybook: {}", input.ticket_text, input.playbook);

    Ok(CompletionRequest { system, user })
}
