use crate::domain::order::{FulfillmentStage, OrderRecord, STATUS_PROCESSING};
use crate::domain::playbook::PolicyType;
use crate::domain::policy::PolicyConfig;
use crate::domain::simulation::CitationSource;
use crate::engine::evidence::Evidence;
use crate::engine::Resolution;

pub(crate) fn resolve(order: &OrderRecord, policy: &PolicyConfig, evidence: &mut Evidence) -> Resolution {
    let status = order.resolved_status(STATUS_PROCESSING);

    evidence.step(
        "Checking WISMO policy rules",
        format!("Found {} active rules", policy.active_rule_count()),
    );
    evidence.cite_policy_type(PolicyType::ShippingEta);

    let reply = match FulfillmentStage::classify(status) {
        FulfillmentStage::Shipped => {
            let tracking = order.tracking_reference();
            let delivery = order.estimated_delivery.as_deref();

            if let Some(tracking) = tracking {
                evidence.cite(CitationSource::Order, "tracking_url", tracking);
            }
            if let Some(delivery) = delivery {
                evidence.cite(CitationSource::Order, "estimated_delivery", delivery);
            }

            let tracking_line = match tracking {
                Some(tracking) => format!("You can track your package here: {tracking}"),
                None => "Your tracking information will be available soon.".to_string(),
            };
            let delivery_line = match delivery {
                Some(delivery) => format!("Expected delivery: {delivery}"),
                None => "Estimated delivery is typically 3-7 business days from shipment."
                    .to_string(),
            };

            format!(
                "Hi there! Great news - your order has shipped! 📦\n\n\
                 {tracking_line}\n\n\
                 {delivery_line}\n\n\
                 Is there anything else I can help you with?"
            )
        }
        FulfillmentStage::Preparing => "Hi there! Thanks for reaching out about your order.\n\n\
             Your order is currently being processed and prepared for shipment. Orders \
             typically ship within 1-2 business days.\n\n\
             Once your order ships, you'll receive an email with tracking information. You can \
             also check your order status anytime in your account.\n\n\
             Is there anything else I can help you with?"
            .to_string(),
        FulfillmentStage::Other => format!(
            "Hi there! I'd be happy to help you with your order status.\n\n\
             Let me look into this for you. Based on our records, your order is in \"{status}\" \
             status.\n\n\
             If you have any specific questions or concerns, please let me know and I'll do my \
             best to assist you!"
        ),
    };

    Resolution::success(reply)
}
