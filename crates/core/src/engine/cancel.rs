use crate::domain::order::{FulfillmentStage, OrderRecord, STATUS_UNKNOWN};
use crate::domain::playbook::PolicyType;
use crate::domain::simulation::{CitationSource, SimulationStatus};
use crate::engine::evidence::Evidence;
use crate::engine::Resolution;

const FINAL_SALE_REPLY: &str = "Hi there! I understand you'd like to cancel your order.\n\n\
    I can see your order contains final sale items. Per our policy, final sale items cannot be \
    cancelled or returned.\n\n\
    However, I can help you cancel the non-final-sale items if you'd like. Would you like me to \
    proceed with a partial cancellation?\n\n\
    Alternatively, I can connect you with a team member who may be able to help explore other \
    options.";

const CANCELLED_REPLY: &str = "Hi there! I'd be happy to help you cancel your order.\n\n\
    Good news - your order hasn't shipped yet, so I can process the cancellation for you right \
    away.\n\n\
    [SIMULATED: In a live environment, the cancellation would be processed automatically]\n\n\
    You'll receive a confirmation email shortly, and your refund will be processed within 5-10 \
    business days.\n\n\
    Is there anything else I can help you with?";

const ALREADY_SHIPPED_REPLY: &str = "Hi there! I understand you'd like to cancel your order.\n\n\
    Unfortunately, your order has already shipped, so we're unable to cancel it at this point.\n\n\
    However, you can return the items once they arrive! Here's what to do:\n\
    1. Wait for your package to arrive\n\
    2. Visit our returns portal at [your returns URL]\n\
    3. Follow the instructions to initiate a return\n\n\
    Alternatively, you can refuse the package upon delivery, and it will be returned to us \
    automatically.\n\n\
    Is there anything else I can help you with?";

const HANDOFF_REPLY: &str = "Hi there! I understand you'd like to cancel your order.\n\n\
    I need to check a few things to help you with this request. Let me connect you with a team \
    member who can look into this further and assist you directly.\n\n\
    Thank you for your patience!";

pub(crate) fn resolve(order: &OrderRecord, evidence: &mut Evidence) -> Resolution {
    let status = order.resolved_status(STATUS_UNKNOWN);

    evidence.step("Checking cancellation eligibility", format!("Order status: {status}"));
    evidence.cite_policy_type(PolicyType::Cancellations);

    let has_final_sale = order.has_final_sale_items();
    if has_final_sale {
        evidence.cite(CitationSource::Order, "line_items.final_sale", "true");
    }

    match FulfillmentStage::classify(status) {
        FulfillmentStage::Preparing if has_final_sale => Resolution::success(FINAL_SALE_REPLY),
        FulfillmentStage::Preparing => Resolution::success(CANCELLED_REPLY),
        FulfillmentStage::Shipped => {
            Resolution::with_status(ALREADY_SHIPPED_REPLY, SimulationStatus::Blocked)
        }
        FulfillmentStage::Other => Resolution::with_status(HANDOFF_REPLY, SimulationStatus::Handoff),
    }
}
