use std::fmt;

use serde::{Deserialize, Serialize};

/// Support scenario a ticket is routed through.
///
/// Identifiers arrive as free text from callers, so anything outside the three
/// supported playbooks is kept verbatim as `Unknown` and handed off downstream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Playbook {
    Wismo,
    Cancel,
    AddressChange,
    Unknown(String),
}

impl Playbook {
    pub const SUPPORTED: [Playbook; 3] = [Self::Wismo, Self::Cancel, Self::AddressChange];

    pub fn parse(value: &str) -> Self {
        match value {
            "wismo" => Self::Wismo,
            "cancel" => Self::Cancel,
            "address_change" => Self::AddressChange,
            _ => Self::Unknown(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Wismo => "wismo",
            Self::Cancel => "cancel",
            Self::AddressChange => "address_change",
            Self::Unknown(raw) => raw,
        }
    }

    /// Policy type backing this playbook, `None` for unknown identifiers.
    pub fn policy_type(&self) -> Option<PolicyType> {
        match self {
            Self::Wismo => Some(PolicyType::ShippingEta),
            Self::Cancel => Some(PolicyType::Cancellations),
            Self::AddressChange => Some(PolicyType::AddressChange),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Playbook {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Playbook> for String {
    fn from(value: Playbook) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Playbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    ShippingEta,
    Cancellations,
    AddressChange,
}

impl PolicyType {
    pub const ALL: [PolicyType; 3] = [Self::ShippingEta, Self::Cancellations, Self::AddressChange];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShippingEta => "shipping_eta",
            Self::Cancellations => "cancellations",
            Self::AddressChange => "address_change",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shipping_eta" => Some(Self::ShippingEta),
            "cancellations" => Some(Self::Cancellations),
            "address_change" => Some(Self::AddressChange),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
