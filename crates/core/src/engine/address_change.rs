use crate::domain::order::{FulfillmentStage, OrderRecord, STATUS_UNKNOWN};
use crate::domain::playbook::PolicyType;
use crate::domain::simulation::SimulationStatus;
use crate::engine::evidence::Evidence;
use crate::engine::Resolution;

const UPDATE_REPLY: &str = "Hi there! I'd be happy to help you update your shipping address.\n\n\
    Good news - your order hasn't shipped yet, so I can update the address for you.\n\n\
    [SIMULATED: In a live environment, the address would be updated automatically]\n\n\
    Please provide your new shipping address in the following format:\n\
    - Street Address\n\
    - City, State/Province\n\
    - Postal/ZIP Code\n\
    - Country\n\n\
    Once I have the new address, I'll update it right away and send you a confirmation!";

const HANDOFF_REPLY: &str = "Hi there! I understand you'd like to update your shipping address.\n\n\
    Let me connect you with a team member who can look into the current status of your order \
    and help you with this request.\n\n\
    Thank you for your patience!";

pub(crate) fn resolve(order: &OrderRecord, evidence: &mut Evidence) -> Resolution {
    let status = order.resolved_status(STATUS_UNKNOWN);

    evidence.step("Checking address change eligibility", format!("Order status: {status}"));
    evidence.cite_policy_type(PolicyType::AddressChange);

    match FulfillmentStage::classify(status) {
        FulfillmentStage::Preparing => Resolution::success(UPDATE_REPLY),
        FulfillmentStage::Shipped => {
            let tracking_option = match order.tracking_reference() {
                Some(tracking) => format!("1. Track your package here: {tracking}"),
                None => "1. Check your shipping confirmation email for tracking".to_string(),
            };
            let reply = format!(
                "Hi there! I understand you'd like to change your shipping address.\n\n\
                 Unfortunately, your order has already shipped, so we're unable to update the \
                 address in our system.\n\n\
                 However, you may have some options:\n\
                 {tracking_option}\n\
                 2. Contact the carrier directly to request a hold or redirect (fees may apply)\n\
                 3. If the package is returned to us, we can reship to your new address\n\n\
                 Would you like me to help with any of these options?"
            );
            Resolution::with_status(reply, SimulationStatus::Blocked)
        }
        FulfillmentStage::Other => Resolution::with_status(HANDOFF_REPLY, SimulationStatus::Handoff),
    }
}
