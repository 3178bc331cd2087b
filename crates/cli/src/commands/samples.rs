use std::collections::BTreeMap;

use replydesk_core::domain::playbook::Playbook;
use replydesk_core::domain::samples::{sample_order, sample_ticket, SAMPLE_ORDER_NAMES};
use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct SampleCatalog {
    orders: BTreeMap<&'static str, Value>,
    tickets: BTreeMap<String, &'static str>,
}

pub fn run() -> CommandResult {
    let orders = SAMPLE_ORDER_NAMES
        .iter()
        .filter_map(|name| sample_order(name).map(|order| (*name, order)))
        .collect();
    let tickets = Playbook::SUPPORTED
        .iter()
        .map(|playbook| (playbook.as_str().to_string(), sample_ticket(playbook)))
        .collect();

    CommandResult::data("samples", &SampleCatalog { orders, tickets })
}
