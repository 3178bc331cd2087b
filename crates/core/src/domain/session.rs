//! Versioned per-session state: the policy set and the simulation log.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::playbook::{Playbook, PolicyType};
use crate::domain::policy::{default_policies, default_policy, PolicyConfig, PolicyUpdate};
use crate::domain::simulation::SimulationLog;
use crate::errors::DomainError;

pub const SESSION_STATE_VERSION: u32 = 1;
pub const MAX_SIMULATION_LOGS: usize = 100;
pub const GUEST_TRIAL_SECS: i64 = 3 * 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub version: u32,
    pub policies: Vec<PolicyConfig>,
    #[serde(default)]
    pub logs: Vec<SimulationLog>,
    #[serde(default)]
    pub meaningful_action_completed: bool,
    #[serde(default)]
    pub has_seen_save_prompt: bool,
    pub guest_session_started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of reading a stored blob. `changed` means the caller should persist `state`.
#[derive(Clone, Debug, PartialEq)]
pub struct RestoredSession {
    pub state: SessionState,
    pub changed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncExport {
    pub policies: Vec<PolicyConfig>,
    pub logs: Vec<SimulationLog>,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: SESSION_STATE_VERSION,
            policies: default_policies(now),
            logs: Vec::new(),
            meaningful_action_completed: false,
            has_seen_save_prompt: false,
            guest_session_started_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parses a stored blob, migrating older versions onto the current shape.
    ///
    /// Fields are decoded one by one: a policy or log entry that does not decode is
    /// dropped and the rest is kept. Only text that is not JSON at all is reported as
    /// changed fresh defaults; other non-object JSON yields defaults that are not
    /// written back until the session is edited.
    pub fn restore(blob: &str, now: DateTime<Utc>) -> RestoredSession {
        let mut stored = match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(stored)) => stored,
            Ok(_) => return RestoredSession { state: Self::new(now), changed: false },
            Err(_) => return RestoredSession { state: Self::new(now), changed: true },
        };

        let mut changed = false;
        let version = stored.get("version").and_then(Value::as_u64);
        if version != Some(u64::from(SESSION_STATE_VERSION)) {
            stored = migrate_onto_defaults(stored, now);
            changed = true;
        }

        let has_guest_start =
            stored.get("guestSessionStartedAt").and_then(Value::as_str).is_some_and(|v| !v.is_empty());
        if !has_guest_start {
            let fallback = stored
                .get("createdAt")
                .filter(|value| value.as_str().is_some_and(|v| !v.is_empty()))
                .cloned()
                .unwrap_or_else(|| Value::String(now.to_rfc3339()));
            stored.insert("guestSessionStartedAt".to_string(), fallback);
            changed = true;
        }

        let mut state = decode_lenient(&stored, now);
        changed |= state.ensure_policy_set(now);
        RestoredSession { state, changed }
    }

    pub fn policy(&self, policy_type: PolicyType) -> Option<&PolicyConfig> {
        self.policies.iter().find(|policy| policy.policy_type == policy_type)
    }

    /// Policy a playbook runs against; unknown playbooks fall onto the address-change policy.
    pub fn policy_for(&self, playbook: &Playbook) -> Option<&PolicyConfig> {
        self.policy(playbook.policy_type().unwrap_or(PolicyType::AddressChange))
    }

    pub fn update_policy(
        &mut self,
        policy_type: PolicyType,
        update: PolicyUpdate,
        now: DateTime<Utc>,
    ) -> Result<&PolicyConfig, DomainError> {
        let policy = self
            .policies
            .iter_mut()
            .find(|policy| policy.policy_type == policy_type)
            .ok_or(DomainError::PolicyMissing(policy_type))?;
        policy.apply_update(update, now);
        Ok(policy)
    }

    /// Newest first; the oldest entries beyond the cap are dropped.
    pub fn append_log(&mut self, log: SimulationLog) {
        self.logs.insert(0, log);
        self.logs.truncate(MAX_SIMULATION_LOGS);
        self.meaningful_action_completed = true;
    }

    pub fn mark_save_prompt_seen(&mut self) {
        self.has_seen_save_prompt = true;
    }

    pub fn guest_trial_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.guest_session_started_at >= Duration::seconds(GUEST_TRIAL_SECS)
    }

    pub fn export_for_sync(&self) -> SyncExport {
        SyncExport {
            policies: self.policies.clone(),
            logs: self.logs.clone(),
            created_at: self.created_at,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Keeps exactly one policy per type: first occurrence wins, missing types get defaults.
    pub fn ensure_policy_set(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.policies.len();
        let mut seen = HashSet::new();
        self.policies.retain(|policy| seen.insert(policy.policy_type));
        let mut changed = self.policies.len() != before;

        for policy_type in PolicyType::ALL {
            if !seen.contains(&policy_type) {
                self.policies.push(default_policy(policy_type, now));
                changed = true;
            }
        }

        changed
    }
}

fn decode_lenient(stored: &Map<String, Value>, now: DateTime<Utc>) -> SessionState {
    let timestamp = |key: &str| {
        stored
            .get(key)
            .and_then(|value| serde_json::from_value::<DateTime<Utc>>(value.clone()).ok())
            .unwrap_or(now)
    };
    let flag = |key: &str| stored.get(key).and_then(Value::as_bool).unwrap_or(false);

    SessionState {
        version: SESSION_STATE_VERSION,
        policies: decode_entries(stored.get("policies")),
        logs: decode_entries(stored.get("logs")),
        meaningful_action_completed: flag("meaningfulActionCompleted"),
        has_seen_save_prompt: flag("hasSeenSavePrompt"),
        guest_session_started_at: timestamp("guestSessionStartedAt"),
        created_at: timestamp("createdAt"),
        updated_at: timestamp("updatedAt"),
    }
}

/// Decodes each array element on its own, skipping the ones that do not fit `T`.
fn decode_entries<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries.iter().filter_map(|entry| serde_json::from_value(entry.clone()).ok()).collect()
        })
        .unwrap_or_default()
}

fn migrate_onto_defaults(stored: Map<String, Value>, now: DateTime<Utc>) -> Map<String, Value> {
    let mut merged = match serde_json::to_value(SessionState::new(now)) {
        Ok(Value::Object(defaults)) => defaults,
        _ => Map::new(),
    };
    // Left to the back-fill so legacy blobs inherit their own createdAt.
    merged.remove("guestSessionStartedAt");
    merged.extend(stored);
    merged.insert("version".to_string(), Value::from(SESSION_STATE_VERSION));
    merged
}
