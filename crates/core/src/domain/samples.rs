//! Demo tickets and orders for exercising the playbooks without a store front.

use serde_json::{json, Value};

use crate::domain::playbook::Playbook;

pub const SAMPLE_ORDER_NAMES: [&str; 3] = ["shipped", "pending", "final_sale"];

pub fn sample_order(name: &str) -> Option<Value> {
    let order = match name {
        "shipped" => json!({
            "id": "ORD-12345",
            "status": "fulfilled",
            "fulfillment_status": "shipped",
            "customer_email": "customer@example.com",
            "created_at": "2024-01-15T10:00:00Z",
            "shipping_address": {
                "name": "John Doe",
                "address1": "123 Main St",
                "city": "New York",
                "province": "NY",
                "zip": "10001",
                "country": "US"
            },
            "tracking_number": "1Z999AA10123456784",
            "tracking_url": "https://track.example.com/1Z999AA10123456784",
            "estimated_delivery": "2024-01-20",
            "line_items": [
                { "name": "Premium Widget", "quantity": 2, "price": 49.99, "final_sale": false },
                { "name": "Basic Gadget", "quantity": 1, "price": 29.99, "final_sale": false }
            ],
            "total": 129.97
        }),
        "pending" => json!({
            "id": "ORD-67890",
            "status": "pending",
            "fulfillment_status": "unfulfilled",
            "customer_email": "customer@example.com",
            "created_at": "2024-01-18T14:30:00Z",
            "shipping_address": {
                "name": "Jane Smith",
                "address1": "456 Oak Ave",
                "city": "Los Angeles",
                "province": "CA",
                "zip": "90001",
                "country": "US"
            },
            "tracking_number": null,
            "tracking_url": null,
            "estimated_delivery": null,
            "line_items": [
                { "name": "Deluxe Package", "quantity": 1, "price": 199.99, "final_sale": false }
            ],
            "total": 199.99
        }),
        "final_sale" => json!({
            "id": "ORD-11111",
            "status": "pending",
            "fulfillment_status": "unfulfilled",
            "customer_email": "customer@example.com",
            "created_at": "2024-01-18T16:00:00Z",
            "shipping_address": {
                "name": "Bob Wilson",
                "address1": "789 Pine Rd",
                "city": "Chicago",
                "province": "IL",
                "zip": "60601",
                "country": "US"
            },
            "tracking_number": null,
            "tracking_url": null,
            "estimated_delivery": null,
            "line_items": [
                { "name": "Clearance Item", "quantity": 1, "price": 39.99, "final_sale": true },
                { "name": "Regular Item", "quantity": 1, "price": 59.99, "final_sale": false }
            ],
            "total": 99.98
        }),
        _ => return None,
    };
    Some(order)
}

pub fn sample_ticket(playbook: &Playbook) -> &'static str {
    match playbook {
        Playbook::Wismo => {
            "Hi, I placed an order last week and I'm wondering when it will arrive? I haven't \
             received any shipping updates. My order number is ORD-12345. Can you please check \
             on this for me? Thanks!"
        }
        Playbook::Cancel => {
            "Hello, I need to cancel my order. I accidentally ordered the wrong item and \
             realized it right after placing the order. Please cancel order ORD-67890 as soon \
             as possible. Thank you."
        }
        Playbook::AddressChange | Playbook::Unknown(_) => {
            "Hi there, I just realized I put the wrong shipping address on my order. Can you \
             please update it? My new address is 123 New Street, Brooklyn, NY 11201. Order \
             number is ORD-67890."
        }
    }
}

/// Sample order paired with a playbook when the caller does not pick one.
pub fn default_sample_for(playbook: &Playbook) -> &'static str {
    match playbook {
        Playbook::Wismo => "shipped",
        _ => "pending",
    }
}

#[cfg(test)]
mod tests {
    use super::{default_sample_for, sample_order, sample_ticket, SAMPLE_ORDER_NAMES};
    use crate::domain::order::OrderRecord;
    use crate::domain::playbook::Playbook;

    #[test]
    fn every_named_sample_parses_as_an_order() {
        for name in SAMPLE_ORDER_NAMES {
            let value = sample_order(name).expect("sample exists");
            let order = OrderRecord::from_value(&value);
            assert!(order.id.is_some(), "{name} should carry an order id");
        }
        assert!(sample_order("custom").is_none());
    }

    #[test]
    fn final_sale_sample_has_a_final_sale_item() {
        let order = OrderRecord::from_value(&sample_order("final_sale").expect("sample"));
        assert!(order.has_final_sale_items());
        assert_eq!(order.tracking_reference(), None);
    }

    #[test]
    fn playbooks_pick_matching_samples() {
        assert_eq!(default_sample_for(&Playbook::Wismo), "shipped");
        assert_eq!(default_sample_for(&Playbook::Cancel), "pending");
        assert!(sample_ticket(&Playbook::Cancel).contains("cancel"));
        assert!(sample_ticket(&Playbook::AddressChange).contains("shipping address"));
    }
}
