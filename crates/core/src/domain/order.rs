//! Loosely-typed order snapshot supplied by callers.
//!
//! Orders come from external systems (or hand-edited JSON), so every field is
//! optional and parsing never rejects a value because of its shape. Scalars are
//! read as text, unusable values are treated as absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const STATUS_UNKNOWN: &str = "unknown";
pub const STATUS_PROCESSING: &str = "processing";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub final_sale: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fulfillment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_object", skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_line_items", skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,
}

/// Where an order sits in fulfillment, as far as the playbooks care.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FulfillmentStage {
    /// `shipped` or `fulfilled`
    Shipped,
    /// `processing`, `pending` or `unfulfilled`
    Preparing,
    Other,
}

impl FulfillmentStage {
    pub fn classify(status: &str) -> Self {
        match status {
            "shipped" | "fulfilled" => Self::Shipped,
            "processing" | "pending" | "unfulfilled" => Self::Preparing,
            _ => Self::Other,
        }
    }
}

impl OrderRecord {
    /// Reads an arbitrary JSON value; anything that is not an object is an empty order.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// `fulfillment_status`, then `status`, then `default`.
    pub fn resolved_status<'a>(&'a self, default: &'a str) -> &'a str {
        self.fulfillment_status.as_deref().or(self.status.as_deref()).unwrap_or(default)
    }

    /// Customer-facing tracking reference: the URL when present, else the raw number.
    pub fn tracking_reference(&self) -> Option<&str> {
        self.tracking_url.as_deref().or(self.tracking_number.as_deref())
    }

    pub fn has_final_sale_items(&self) -> bool {
        self.line_items.iter().any(|item| item.final_sale)
    }
}

fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn line_item_of(value: &Value) -> Option<LineItem> {
    let object = value.as_object()?;
    Some(LineItem {
        name: object.get("name").and_then(text_of),
        final_sale: matches!(object.get("final_sale"), Some(Value::Bool(true))),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(Some(map)),
        _ => Ok(None),
    }
}

fn lenient_line_items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(items.iter().filter_map(line_item_of).collect()),
        _ => Ok(Vec::new()),
    }
}
