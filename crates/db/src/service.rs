//! Session persistence on top of a `SessionStore`.
//!
//! Every operation is a read-modify-write of the whole blob; concurrent writers to
//! the same key are last-writer-wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use replydesk_core::domain::playbook::PolicyType;
use replydesk_core::domain::policy::{PolicyConfig, PolicyRule, PolicyUpdate, RuleField};
use replydesk_core::domain::session::{SessionState, SyncExport};
use replydesk_core::domain::simulation::SimulationLog;
use replydesk_core::errors::{ApplicationError, DomainError};
use thiserror::Error;
use tracing::{debug, info};

use crate::repositories::{RepositoryError, SessionStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("session state could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ServiceError> for ApplicationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Domain(error) => ApplicationError::Domain(error),
            ServiceError::Repository(error) => ApplicationError::Persistence(error.to_string()),
            ServiceError::Encode(error) => ApplicationError::Persistence(error.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Loads the session for `key`, creating or migrating it as needed.
    ///
    /// The state is written back only when it did not exist or `restore` changed it.
    pub async fn load_or_init(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionState, ServiceError> {
        let (state, changed) = match self.store.load(key).await? {
            Some(blob) => {
                let restored = SessionState::restore(&blob, now);
                (restored.state, restored.changed)
            }
            None => (SessionState::new(now), true),
        };

        if changed {
            debug!(event_name = "session.initialized", session_key = key, "persisting restored session");
            self.write(key, &state).await?;
        }

        Ok(state)
    }

    pub async fn save(
        &self,
        key: &str,
        state: &mut SessionState,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        state.touch(now);
        self.write(key, state).await
    }

    pub async fn record_simulation(
        &self,
        key: &str,
        log: SimulationLog,
        now: DateTime<Utc>,
    ) -> Result<SessionState, ServiceError> {
        let mut state = self.load_or_init(key, now).await?;
        let log_id = log.id.clone();
        state.append_log(log);
        self.save(key, &mut state, now).await?;

        info!(
            event_name = "session.simulation.recorded",
            session_key = key,
            log_id = %log_id,
            log_count = state.logs.len(),
            "simulation log appended"
        );
        Ok(state)
    }

    /// Replaces name and/or rules of one policy; an update that leaves the policy
    /// invalid is rejected and nothing is written.
    pub async fn update_policy(
        &self,
        key: &str,
        policy_type: PolicyType,
        update: PolicyUpdate,
        now: DateTime<Utc>,
    ) -> Result<PolicyConfig, ServiceError> {
        let mut state = self.load_or_init(key, now).await?;
        let policy = state.update_policy(policy_type, update, now)?.clone();
        policy.validate()?;
        self.save(key, &mut state, now).await?;

        info!(
            event_name = "session.policy.updated",
            session_key = key,
            policy_type = policy_type.as_str(),
            rule_count = policy.rules.len(),
            "policy updated"
        );
        Ok(policy)
    }

    pub async fn add_rule(
        &self,
        key: &str,
        policy_type: PolicyType,
        now: DateTime<Utc>,
    ) -> Result<PolicyRule, ServiceError> {
        self.edit_policy(key, policy_type, now, |policy| Ok(policy.add_rule(now).clone())).await
    }

    pub async fn toggle_rule(
        &self,
        key: &str,
        policy_type: PolicyType,
        rule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        self.edit_policy(key, policy_type, now, |policy| policy.toggle_rule(rule_id, now)).await
    }

    pub async fn update_rule(
        &self,
        key: &str,
        policy_type: PolicyType,
        rule_id: &str,
        field: RuleField,
        value: String,
        now: DateTime<Utc>,
    ) -> Result<PolicyConfig, ServiceError> {
        self.edit_policy(key, policy_type, now, |policy| {
            policy.update_rule(rule_id, field, value, now)?;
            Ok(policy.clone())
        })
        .await
    }

    pub async fn remove_rule(
        &self,
        key: &str,
        policy_type: PolicyType,
        rule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PolicyRule, ServiceError> {
        self.edit_policy(key, policy_type, now, |policy| policy.remove_rule(rule_id, now)).await
    }

    pub async fn mark_save_prompt_seen(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionState, ServiceError> {
        let mut state = self.load_or_init(key, now).await?;
        state.mark_save_prompt_seen();
        self.save(key, &mut state, now).await?;
        Ok(state)
    }

    pub async fn export(&self, key: &str, now: DateTime<Utc>) -> Result<SyncExport, ServiceError> {
        Ok(self.load_or_init(key, now).await?.export_for_sync())
    }

    pub async fn clear(&self, key: &str) -> Result<(), ServiceError> {
        self.store.clear(key).await?;
        info!(event_name = "session.cleared", session_key = key, "session state cleared");
        Ok(())
    }

    async fn edit_policy<T>(
        &self,
        key: &str,
        policy_type: PolicyType,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut PolicyConfig) -> Result<T, DomainError>,
    ) -> Result<T, ServiceError> {
        let mut state = self.load_or_init(key, now).await?;
        let policy = state
            .policies
            .iter_mut()
            .find(|policy| policy.policy_type == policy_type)
            .ok_or(DomainError::PolicyMissing(policy_type))?;
        let outcome = edit(policy)?;
        self.save(key, &mut state, now).await?;
        Ok(outcome)
    }

    async fn write(&self, key: &str, state: &SessionState) -> Result<(), ServiceError> {
        let blob = serde_json::to_string(state)?;
        self.store.save(key, blob).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use replydesk_core::domain::playbook::{Playbook, PolicyType};
    use replydesk_core::domain::policy::{PolicyRule, PolicyUpdate, RuleField};
    use replydesk_core::domain::session::{SessionState, MAX_SIMULATION_LOGS, SESSION_STATE_VERSION};
    use replydesk_core::domain::simulation::{SimulationLog, SimulationResult};
    use replydesk_core::errors::{ApplicationError, DomainError};

    use super::{ServiceError, SessionService};
    use crate::repositories::{InMemorySessionStore, SessionStore, SqlSessionStore};
    use crate::{connect_with_settings, migrations};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).single().expect("timestamp")
    }

    fn service() -> (SessionService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::default());
        (SessionService::new(store.clone()), store)
    }

    fn log(n: usize) -> SimulationLog {
        SimulationLog::new(
            Playbook::Wismo,
            format!("ticket {n}"),
            None,
            SimulationResult::error("test"),
            now(),
        )
    }

    #[tokio::test]
    async fn first_load_persists_defaults() {
        let (service, store) = service();

        let state = service.load_or_init("guest-1", now()).await.expect("load");

        assert_eq!(state.version, SESSION_STATE_VERSION);
        assert_eq!(state.policies.len(), 3);
        let blob = store.load("guest-1").await.expect("load").expect("persisted");
        assert_eq!(SessionState::restore(&blob, now()).state, state);
    }

    #[tokio::test]
    async fn legacy_blob_is_migrated_and_written_back() {
        let (service, store) = service();
        store
            .save(
                "guest-1",
                r#"{"policies": [], "logs": [], "createdAt": "2026-01-01T00:00:00Z"}"#.to_string(),
            )
            .await
            .expect("seed");

        let state = service.load_or_init("guest-1", now()).await.expect("load");

        assert_eq!(state.version, SESSION_STATE_VERSION);
        assert_eq!(state.guest_session_started_at.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        let blob = store.load("guest-1").await.expect("load").expect("persisted");
        assert!(blob.contains("\"version\":1"));
    }

    #[tokio::test]
    async fn malformed_log_does_not_reset_a_stored_session() {
        let (service, store) = service();
        let mut state = SessionState::new(now());
        state.policies[1].name = "Edited Cancellations".to_string();
        state.append_log(log(1));
        let mut value = serde_json::to_value(&state).expect("encode");
        let mut broken = value["logs"][0].clone();
        broken["result"]["status"] = serde_json::json!("escalated");
        value["logs"].as_array_mut().map(|logs| logs.push(broken)).expect("logs array");
        let blob = value.to_string();
        store.save("guest-1", blob.clone()).await.expect("seed");

        let loaded = service.load_or_init("guest-1", now()).await.expect("load");

        assert_eq!(loaded.policies[1].name, "Edited Cancellations");
        assert_eq!(loaded.logs.len(), 1);
        assert_eq!(store.load("guest-1").await.expect("load"), Some(blob));
    }

    #[tokio::test]
    async fn simulations_are_logged_newest_first_and_capped() {
        let (service, _) = service();

        for n in 0..=MAX_SIMULATION_LOGS {
            service.record_simulation("guest-1", log(n), now()).await.expect("record");
        }
        let state = service.load_or_init("guest-1", now()).await.expect("load");

        assert_eq!(state.logs.len(), MAX_SIMULATION_LOGS);
        assert_eq!(state.logs[0].ticket_text, format!("ticket {MAX_SIMULATION_LOGS}"));
        assert!(state.logs.iter().all(|log| log.ticket_text != "ticket 0"));
        assert!(state.meaningful_action_completed);
    }

    #[tokio::test]
    async fn policy_update_is_persisted() {
        let (service, _) = service();
        let later = now() + Duration::minutes(5);

        let policy = service
            .update_policy(
                "guest-1",
                PolicyType::Cancellations,
                PolicyUpdate { name: Some("Strict cancellations".to_string()), rules: None },
                later,
            )
            .await
            .expect("update");

        assert_eq!(policy.name, "Strict cancellations");
        let state = service.load_or_init("guest-1", later).await.expect("load");
        assert_eq!(state.policy(PolicyType::Cancellations), Some(&policy));
        assert_eq!(state.updated_at, later);
    }

    #[tokio::test]
    async fn invalid_policy_update_is_rejected_without_writing() {
        let (service, _) = service();
        let duplicate = PolicyRule::new("dup", "a", "b");

        let error = service
            .update_policy(
                "guest-1",
                PolicyType::AddressChange,
                PolicyUpdate { name: None, rules: Some(vec![duplicate.clone(), duplicate]) },
                now(),
            )
            .await
            .expect_err("duplicate ids should be rejected");

        assert!(matches!(error, ServiceError::Domain(DomainError::InvalidPolicy { .. })));
        let state = service.load_or_init("guest-1", now()).await.expect("load");
        assert_eq!(state.policy(PolicyType::AddressChange).map(|p| p.rules.len()), Some(3));
    }

    #[tokio::test]
    async fn blank_policy_name_is_rejected_on_edit() {
        let (service, _) = service();

        let error = service
            .update_policy(
                "guest-1",
                PolicyType::Cancellations,
                PolicyUpdate { name: Some("   ".to_string()), rules: None },
                now(),
            )
            .await
            .expect_err("blank names should be rejected");

        assert!(matches!(error, ServiceError::Domain(DomainError::InvalidPolicy { .. })));
        let state = service.load_or_init("guest-1", now()).await.expect("load");
        assert_eq!(
            state.policy(PolicyType::Cancellations).map(|p| p.name.as_str()),
            Some("Cancellation Eligibility Policy")
        );
    }

    #[tokio::test]
    async fn rule_edits_round_trip_through_the_store() {
        let (service, _) = service();

        let added = service.add_rule("guest-1", PolicyType::ShippingEta, now()).await.expect("add");
        let enabled = service
            .toggle_rule("guest-1", PolicyType::ShippingEta, &added.id, now())
            .await
            .expect("toggle");
        let policy = service
            .update_rule(
                "guest-1",
                PolicyType::ShippingEta,
                &added.id,
                RuleField::Condition,
                "Order is lost".to_string(),
                now(),
            )
            .await
            .expect("update rule");

        assert!(!enabled);
        assert!(policy.rules.iter().any(|rule| rule.id == added.id && rule.condition == "Order is lost"));

        let removed = service
            .remove_rule("guest-1", PolicyType::ShippingEta, &added.id, now())
            .await
            .expect("remove");
        assert_eq!(removed.id, added.id);

        let missing = service
            .toggle_rule("guest-1", PolicyType::ShippingEta, &added.id, now())
            .await
            .expect_err("removed rule is gone");
        assert!(matches!(
            ApplicationError::from(missing),
            ApplicationError::Domain(DomainError::RuleNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn save_prompt_export_and_clear() {
        let (service, store) = service();

        let state = service.mark_save_prompt_seen("guest-1", now()).await.expect("mark");
        assert!(state.has_seen_save_prompt);

        service.record_simulation("guest-1", log(1), now()).await.expect("record");
        let export = service.export("guest-1", now()).await.expect("export");
        assert_eq!(export.logs.len(), 1);
        assert_eq!(export.policies.len(), 3);

        service.clear("guest-1").await.expect("clear");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sql_store_backs_the_service() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let service = SessionService::new(Arc::new(SqlSessionStore::new(pool)));

        service.record_simulation("guest-1", log(7), now()).await.expect("record");
        let state = service.load_or_init("guest-1", now()).await.expect("load");

        assert_eq!(state.logs.len(), 1);
        assert_eq!(state.logs[0].ticket_text, "ticket 7");
    }
}
