//! JSON API for playbook decisions and session state.
//!
//! - `POST   /api/ai`                                                  — stateless decision
//! - `GET    /api/v1/sessions/{key}`                                   — load (create/migrate) a session
//! - `DELETE /api/v1/sessions/{key}`                                   — clear a session
//! - `GET    /api/v1/sessions/{key}/export`                            — policies and logs snapshot
//! - `POST   /api/v1/sessions/{key}/save-prompt`                       — record that the save prompt was shown
//! - `PUT    /api/v1/sessions/{key}/policies/{type}`                   — replace policy name/rules
//! - `POST   /api/v1/sessions/{key}/policies/{type}/rules`             — add a blank rule
//! - `PATCH  /api/v1/sessions/{key}/policies/{type}/rules/{rule_id}`   — edit a rule's condition or action
//! - `POST   /api/v1/sessions/{key}/policies/{type}/rules/{rule_id}/toggle`
//! - `DELETE /api/v1/sessions/{key}/policies/{type}/rules/{rule_id}`
//! - `POST   /api/v1/sessions/{key}/simulations`                       — decide against the session policy and log it

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use replydesk_agent::PlaybookRuntime;
use replydesk_core::domain::playbook::{Playbook, PolicyType};
use replydesk_core::domain::policy::{PolicyConfig, PolicyRule, PolicyUpdate, RuleField};
use replydesk_core::domain::session::{SessionState, SyncExport};
use replydesk_core::domain::simulation::{SimulationLog, SimulationResult};
use replydesk_core::engine::DecisionInput;
use replydesk_core::errors::{ApplicationError, DomainError, InterfaceError};
use replydesk_db::{ServiceError, SessionService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MISSING_AI_FIELDS: &str = "Missing required fields: ticketText, playbook, policyJson";
pub const MISSING_SIMULATION_FIELDS: &str = "Missing required fields: ticketText, playbook";

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<PlaybookRuntime>,
    sessions: SessionService,
}

impl ApiState {
    pub fn new(runtime: Arc<PlaybookRuntime>, sessions: SessionService) -> Self {
        Self { runtime, sessions }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    pub ticket_text: Option<String>,
    pub playbook: Option<String>,
    pub policy_json: Option<Value>,
    pub order_json: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub ticket_text: Option<String>,
    pub playbook: Option<String>,
    pub order_json: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RuleEditRequest {
    pub field: RuleField,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    #[serde(flatten)]
    pub result: SimulationResult,
    pub ai_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub state: SessionState,
    pub guest_trial_expired: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleToggleResponse {
    pub rule_id: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/ai", post(decide))
        .route("/api/v1/sessions/{key}", get(get_session).delete(clear_session))
        .route("/api/v1/sessions/{key}/export", get(export_session))
        .route("/api/v1/sessions/{key}/save-prompt", post(mark_save_prompt))
        .route("/api/v1/sessions/{key}/policies/{policy_type}", put(update_policy))
        .route("/api/v1/sessions/{key}/policies/{policy_type}/rules", post(add_rule))
        .route(
            "/api/v1/sessions/{key}/policies/{policy_type}/rules/{rule_id}",
            axum::routing::patch(edit_rule).delete(remove_rule),
        )
        .route(
            "/api/v1/sessions/{key}/policies/{policy_type}/rules/{rule_id}/toggle",
            post(toggle_rule),
        )
        .route("/api/v1/sessions/{key}/simulations", post(simulate))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn decide(
    State(state): State<ApiState>,
    body: Result<Json<AiRequest>, JsonRejection>,
) -> ApiResult<DecisionResponse> {
    let correlation_id = new_correlation_id();
    let request = body.map(|Json(request)| request).map_err(|rejection| {
        warn!(
            event_name = "api.ai.rejected",
            correlation_id = %correlation_id,
            error = %rejection,
            "request body could not be decoded"
        );
        bad_request(MISSING_AI_FIELDS)
    })?;

    let (Some(ticket_text), Some(playbook), Some(policy_json)) = (
        non_empty(request.ticket_text),
        non_empty(request.playbook),
        request.policy_json.filter(|value| !value.is_null()),
    ) else {
        return Err(bad_request(MISSING_AI_FIELDS));
    };

    let policy: PolicyConfig = serde_json::from_value(policy_json)
        .map_err(|error| bad_request(format!("Invalid policyJson: {error}")))?;
    let playbook = Playbook::parse(&playbook);
    let order = request.order_json.filter(|value| !value.is_null());

    let result = state
        .runtime
        .decide(
            &DecisionInput {
                ticket_text: &ticket_text,
                playbook: &playbook,
                policy: &policy,
                order: order.as_ref(),
            },
            &correlation_id,
        )
        .await;

    info!(
        event_name = "api.ai.decided",
        correlation_id = %correlation_id,
        playbook = playbook.as_str(),
        status = result.status.as_str(),
        "playbook decision returned"
    );

    Ok(Json(DecisionResponse { result, ai_configured: state.runtime.ai_configured(), log_id: None }))
}

async fn get_session(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<SessionView> {
    let now = Utc::now();
    let session = state.sessions.load_or_init(&key, now).await.map_err(service_error)?;
    Ok(Json(session_view(session, now)))
}

async fn clear_session(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state.sessions.clear(&key).await.map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_session(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<SyncExport> {
    let export = state.sessions.export(&key, Utc::now()).await.map_err(service_error)?;
    Ok(Json(export))
}

async fn mark_save_prompt(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<SessionView> {
    let now = Utc::now();
    let session = state.sessions.mark_save_prompt_seen(&key, now).await.map_err(service_error)?;
    Ok(Json(session_view(session, now)))
}

async fn update_policy(
    State(state): State<ApiState>,
    Path((key, policy_type)): Path<(String, String)>,
    body: Result<Json<PolicyUpdate>, JsonRejection>,
) -> ApiResult<PolicyConfig> {
    let policy_type = parse_policy_type(&policy_type)?;
    let Json(update) = body.map_err(|rejection| bad_request(rejection.body_text()))?;

    let policy = state
        .sessions
        .update_policy(&key, policy_type, update, Utc::now())
        .await
        .map_err(service_error)?;
    Ok(Json(policy))
}

async fn add_rule(
    State(state): State<ApiState>,
    Path((key, policy_type)): Path<(String, String)>,
) -> Result<(StatusCode, Json<PolicyRule>), (StatusCode, Json<ApiError>)> {
    let policy_type = parse_policy_type(&policy_type)?;
    let rule =
        state.sessions.add_rule(&key, policy_type, Utc::now()).await.map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn edit_rule(
    State(state): State<ApiState>,
    Path((key, policy_type, rule_id)): Path<(String, String, String)>,
    body: Result<Json<RuleEditRequest>, JsonRejection>,
) -> ApiResult<PolicyConfig> {
    let policy_type = parse_policy_type(&policy_type)?;
    let Json(edit) = body.map_err(|rejection| bad_request(rejection.body_text()))?;

    let policy = state
        .sessions
        .update_rule(&key, policy_type, &rule_id, edit.field, edit.value, Utc::now())
        .await
        .map_err(service_error)?;
    Ok(Json(policy))
}

async fn toggle_rule(
    State(state): State<ApiState>,
    Path((key, policy_type, rule_id)): Path<(String, String, String)>,
) -> ApiResult<RuleToggleResponse> {
    let policy_type = parse_policy_type(&policy_type)?;
    let enabled = state
        .sessions
        .toggle_rule(&key, policy_type, &rule_id, Utc::now())
        .await
        .map_err(service_error)?;
    Ok(Json(RuleToggleResponse { rule_id, enabled }))
}

async fn remove_rule(
    State(state): State<ApiState>,
    Path((key, policy_type, rule_id)): Path<(String, String, String)>,
) -> ApiResult<PolicyRule> {
    let policy_type = parse_policy_type(&policy_type)?;
    let rule = state
        .sessions
        .remove_rule(&key, policy_type, &rule_id, Utc::now())
        .await
        .map_err(service_error)?;
    Ok(Json(rule))
}

async fn simulate(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    body: Result<Json<SimulationRequest>, JsonRejection>,
) -> ApiResult<DecisionResponse> {
    let correlation_id = new_correlation_id();
    let request = body
        .map(|Json(request)| request)
        .map_err(|_| bad_request(MISSING_SIMULATION_FIELDS))?;

    let (Some(ticket_text), Some(playbook)) =
        (non_empty(request.ticket_text), non_empty(request.playbook))
    else {
        return Err(bad_request(MISSING_SIMULATION_FIELDS));
    };

    let now = Utc::now();
    let playbook = Playbook::parse(&playbook);
    let order = request.order_json.filter(|value| !value.is_null());
    let session = state.sessions.load_or_init(&key, now).await.map_err(service_error)?;
    let policy = session.policy_for(&playbook).ok_or_else(|| {
        let policy_type = playbook.policy_type().unwrap_or(PolicyType::AddressChange);
        service_error(ServiceError::Domain(DomainError::PolicyMissing(policy_type)))
    })?;

    let result = state
        .runtime
        .decide(
            &DecisionInput {
                ticket_text: &ticket_text,
                playbook: &playbook,
                policy,
                order: order.as_ref(),
            },
            &correlation_id,
        )
        .await;

    let log = SimulationLog::new(playbook.clone(), ticket_text, order, result.clone(), now);
    let log_id = log.id.clone();
    state.sessions.record_simulation(&key, log, now).await.map_err(service_error)?;

    info!(
        event_name = "api.simulation.recorded",
        correlation_id = %correlation_id,
        session_key = %key,
        playbook = playbook.as_str(),
        status = result.status.as_str(),
        log_id = %log_id,
        "session simulation recorded"
    );

    Ok(Json(DecisionResponse {
        result,
        ai_configured: state.runtime.ai_configured(),
        log_id: Some(log_id),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

fn session_view(state: SessionState, now: chrono::DateTime<Utc>) -> SessionView {
    let guest_trial_expired = state.guest_trial_expired(now);
    SessionView { state, guest_trial_expired }
}

fn parse_policy_type(raw: &str) -> Result<PolicyType, (StatusCode, Json<ApiError>)> {
    PolicyType::parse(raw).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError { error: format!("unknown policy type `{raw}`"), correlation_id: None }),
        )
    })
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into(), correlation_id: None }))
}

fn service_error(error: ServiceError) -> (StatusCode, Json<ApiError>) {
    let interface = ApplicationError::from(error).into_interface(new_correlation_id());
    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::ServiceUnavailable { message, .. } => {
            error!(
                event_name = "api.session.storage_failed",
                correlation_id = interface.correlation_id(),
                error = %message,
                "session storage failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, interface.user_message().to_string())
        }
        InterfaceError::Internal { message, .. } => {
            error!(
                event_name = "api.session.internal_error",
                correlation_id = interface.correlation_id(),
                error = %message,
                "session request failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };

    (status, Json(ApiError { error: message, correlation_id: Some(interface.correlation_id().to_string()) }))
}
