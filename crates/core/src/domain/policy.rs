use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::playbook::PolicyType;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    pub condition: String,
    pub action: String,
    pub enabled: bool,
}

impl PolicyRule {
    pub fn new(id: impl Into<String>, condition: impl Into<String>, action: impl Into<String>) -> Self {
        Self { id: id.into(), condition: condition.into(), action: action.into(), enabled: true }
    }
}

/// Editable text field of a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Condition,
    Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial replacement applied by an explicit user edit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<PolicyRule>>,
}

impl PolicyConfig {
    pub fn active_rule_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.enabled).count()
    }

    /// Full check applied to user edits: a non-blank name plus [`Self::validate_rules`].
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("policy name must not be empty"));
        }
        self.validate_rules()
    }

    /// Structural check the engine relies on: rule ids are non-empty and unique.
    pub fn validate_rules(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(self.invalid("rule ids must not be empty"));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(self.invalid(&format!("duplicate rule id `{}`", rule.id)));
            }
        }

        Ok(())
    }

    pub fn apply_update(&mut self, update: PolicyUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(rules) = update.rules {
            self.rules = rules;
        }
        self.updated_at = Some(now);
    }

    pub fn add_rule(&mut self, now: DateTime<Utc>) -> &PolicyRule {
        let rule = PolicyRule::new(format!("rule-{}", Uuid::new_v4()), "New condition", "New action");
        self.rules.push(rule);
        self.updated_at = Some(now);
        let index = self.rules.len() - 1;
        &self.rules[index]
    }

    pub fn toggle_rule(&mut self, rule_id: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let rule = self.rule_mut(rule_id)?;
        rule.enabled = !rule.enabled;
        let enabled = rule.enabled;
        self.updated_at = Some(now);
        Ok(enabled)
    }

    pub fn update_rule(
        &mut self,
        rule_id: &str,
        field: RuleField,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let rule = self.rule_mut(rule_id)?;
        match field {
            RuleField::Condition => rule.condition = value.into(),
            RuleField::Action => rule.action = value.into(),
        }
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn remove_rule(&mut self, rule_id: &str, now: DateTime<Utc>) -> Result<PolicyRule, DomainError> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or_else(|| self.rule_not_found(rule_id))?;
        self.updated_at = Some(now);
        Ok(self.rules.remove(index))
    }

    fn rule_mut(&mut self, rule_id: &str) -> Result<&mut PolicyRule, DomainError> {
        let missing = self.rule_not_found(rule_id);
        self.rules.iter_mut().find(|rule| rule.id == rule_id).ok_or(missing)
    }

    fn rule_not_found(&self, rule_id: &str) -> DomainError {
        DomainError::RuleNotFound { policy: self.name.clone(), rule_id: rule_id.to_string() }
    }

    fn invalid(&self, reason: &str) -> DomainError {
        DomainError::InvalidPolicy { policy: self.name.clone(), reason: reason.to_string() }
    }
}

/// Starter policy for one playbook type, as seeded into a fresh session.
pub fn default_policy(policy_type: PolicyType, now: DateTime<Utc>) -> PolicyConfig {
    let (name, rules) = match policy_type {
        PolicyType::ShippingEta => (
            "Shipping ETA / WISMO Policy",
            vec![
                PolicyRule::new(
                    "wismo-1",
                    "Order status is \"shipped\"",
                    "Provide tracking link and estimated delivery date",
                ),
                PolicyRule::new(
                    "wismo-2",
                    "Order status is \"processing\"",
                    "Inform customer order is being prepared, provide expected ship date",
                ),
                PolicyRule::new(
                    "wismo-3",
                    "Order is delayed beyond expected delivery",
                    "Apologize and offer expedited shipping or discount on next order",
                ),
            ],
        ),
        PolicyType::Cancellations => (
            "Cancellation Eligibility Policy",
            vec![
                PolicyRule::new(
                    "cancel-1",
                    "Order status is \"unfulfilled\" or \"pending\"",
                    "Cancel order immediately and confirm cancellation",
                ),
                PolicyRule::new(
                    "cancel-2",
                    "Order status is \"fulfilled\" or \"shipped\"",
                    "Inform customer order cannot be cancelled, offer return instructions",
                ),
                PolicyRule::new(
                    "cancel-3",
                    "Order contains final sale items",
                    "Inform customer final sale items cannot be cancelled or returned",
                ),
            ],
        ),
        PolicyType::AddressChange => (
            "Address Change Policy",
            vec![
                PolicyRule::new(
                    "address-1",
                    "Order status is \"unfulfilled\" or \"pending\"",
                    "Update shipping address and confirm change",
                ),
                PolicyRule::new(
                    "address-2",
                    "Order status is \"fulfilled\" or \"shipped\"",
                    "Inform customer address cannot be changed, contact carrier if possible",
                ),
                PolicyRule::new(
                    "address-3",
                    "New address is in a different country",
                    "Require customer to cancel and reorder with correct address",
                ),
            ],
        ),
    };

    PolicyConfig {
        policy_type,
        name: name.to_string(),
        rules,
        created_at: Some(now),
        updated_at: Some(now),
    }
}

pub fn default_policies(now: DateTime<Utc>) -> Vec<PolicyConfig> {
    PolicyType::ALL.into_iter().map(|policy_type| default_policy(policy_type, now)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{default_policies, default_policy, PolicyRule, PolicyUpdate, RuleField};
    use crate::domain::playbook::PolicyType;
    use crate::errors::DomainError;

    #[test]
    fn defaults_cover_every_policy_type_once() {
        let policies = default_policies(Utc::now());

        assert_eq!(policies.len(), 3);
        for policy_type in PolicyType::ALL {
            assert_eq!(policies.iter().filter(|p| p.policy_type == policy_type).count(), 1);
        }
        assert!(policies.iter().all(|policy| policy.validate().is_ok()));
        assert!(policies.iter().all(|policy| policy.active_rule_count() == 3));
    }

    #[test]
    fn policy_json_uses_type_and_camel_case_keys() {
        let policy = default_policy(PolicyType::Cancellations, Utc::now());
        let value = serde_json::to_value(&policy).expect("encode");

        assert_eq!(value["type"], "cancellations");
        assert_eq!(value["name"], "Cancellation Eligibility Policy");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn policy_without_timestamps_still_parses() {
        let policy: super::PolicyConfig = serde_json::from_str(
            r#"{"type":"shipping_eta","name":"Custom","rules":[{"id":"r1","condition":"c","action":"a","enabled":false}]}"#,
        )
        .expect("decode");

        assert_eq!(policy.policy_type, PolicyType::ShippingEta);
        assert_eq!(policy.created_at, None);
        assert_eq!(policy.active_rule_count(), 0);
    }

    #[test]
    fn validation_rejects_duplicate_rule_ids() {
        let mut policy = default_policy(PolicyType::AddressChange, Utc::now());
        policy.rules.push(PolicyRule::new("address-1", "dup", "dup"));

        let error = policy.validate().expect_err("duplicate ids must fail");
        assert!(matches!(error, DomainError::InvalidPolicy { ref reason, .. } if reason.contains("address-1")));
    }

    #[test]
    fn validation_rejects_blank_name() {
        let mut policy = default_policy(PolicyType::ShippingEta, Utc::now());
        policy.name = "  ".to_string();

        assert!(matches!(policy.validate(), Err(DomainError::InvalidPolicy { .. })));
        assert!(policy.validate_rules().is_ok());
    }

    #[test]
    fn rule_edits_toggle_update_add_and_remove() {
        let now = Utc::now();
        let mut policy = default_policy(PolicyType::ShippingEta, now);

        assert!(!policy.toggle_rule("wismo-2", now).expect("toggle"));
        assert_eq!(policy.active_rule_count(), 2);

        policy.update_rule("wismo-1", RuleField::Action, "Send tracking link", now).expect("update");
        assert_eq!(policy.rules[0].action, "Send tracking link");

        let added_id = policy.add_rule(now).id.clone();
        assert!(added_id.starts_with("rule-"));
        assert_eq!(policy.rules.len(), 4);
        assert_eq!(policy.rules[3].condition, "New condition");

        let removed = policy.remove_rule(&added_id, now).expect("remove");
        assert_eq!(removed.id, added_id);
        assert_eq!(policy.rules.len(), 3);
    }

    #[test]
    fn editing_missing_rule_reports_rule_not_found() {
        let now = Utc::now();
        let mut policy = default_policy(PolicyType::Cancellations, now);

        let error = policy.toggle_rule("cancel-42", now).expect_err("missing rule");
        assert_eq!(
            error,
            DomainError::RuleNotFound {
                policy: "Cancellation Eligibility Policy".to_string(),
                rule_id: "cancel-42".to_string(),
            }
        );
        assert!(policy.remove_rule("cancel-42", now).is_err());
    }

    #[test]
    fn apply_update_replaces_only_supplied_fields() {
        let now = Utc::now();
        let mut policy = default_policy(PolicyType::Cancellations, now);

        policy.apply_update(PolicyUpdate { name: Some("Strict cancels".to_string()), rules: None }, now);
        assert_eq!(policy.name, "Strict cancels");
        assert_eq!(policy.rules.len(), 3);

        policy.apply_update(PolicyUpdate { name: None, rules: Some(Vec::new()) }, now);
        assert_eq!(policy.name, "Strict cancels");
        assert!(policy.rules.is_empty());
    }
}
