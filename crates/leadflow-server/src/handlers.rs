//! Route handlers, grouped by resource.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use leadflow_core::{AgentId, AgentRole, EmailDraft, FollowUp, Lead, LeadId, NewLead, TrackingReport};
use leadflow_engine::{ActivitySnapshot, InvocationRecord};
use leadflow_settings::{save_settings_to_path, Settings};

use crate::response::{ActionResponse, ApiError};
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub role: AgentRole,
    pub agent_id: AgentId,
    pub name: &'static str,
    pub purpose: &'static str,
}

pub async fn agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    let directory = state.orchestrator.agents();
    Json(
        AgentRole::ALL
            .iter()
            .map(|&role| AgentInfo {
                role,
                agent_id: directory.agent_for(role).clone(),
                name: role.display_name(),
                purpose: role.purpose(),
            })
            .collect(),
    )
}

// ── Leads ──

pub async fn list_leads(State(state): State<AppState>) -> Json<Vec<Lead>> {
    Json(state.orchestrator.list_leads())
}

pub async fn add_lead(
    State(state): State<AppState>,
    Json(input): Json<NewLead>,
) -> ApiResult<ActionResponse> {
    let lead = state.orchestrator.add_lead(input)?;
    Ok(ActionResponse::success(format!("Lead \"{}\" added successfully.", lead.name)).with_lead(lead))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lead>> {
    Ok(Json(state.orchestrator.get_lead(&LeadId::from_raw(id))?))
}

pub async fn remove_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ActionResponse> {
    let lead = state.orchestrator.remove_lead(&LeadId::from_raw(id))?;
    Ok(ActionResponse::success(format!("Lead \"{}\" removed.", lead.name)).with_lead(lead))
}

#[derive(Debug, Deserialize)]
pub struct EditDraftRequest {
    pub initial_email: EmailDraft,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
}

pub async fn edit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EditDraftRequest>,
) -> ApiResult<ActionResponse> {
    let lead = state
        .orchestrator
        .edit_draft(&LeadId::from_raw(id), req.initial_email, req.follow_ups)?;
    Ok(ActionResponse::success("Draft updated.").with_lead(lead))
}

// ── Pipeline ──

pub async fn generate_outreach(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ActionResponse> {
    let outcome = state
        .orchestrator
        .generate_outreach(&LeadId::from_raw(id))
        .await?;
    Ok(ActionResponse::success(outcome.message).with_lead(outcome.lead))
}

/// Optional edits applied on top of the stored draft before sending.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendRequest {
    pub initial_email: Option<EmailDraft>,
    pub follow_ups: Option<Vec<FollowUp>>,
}

pub async fn send_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> ApiResult<ActionResponse> {
    let outcome = state
        .orchestrator
        .send_email(&LeadId::from_raw(id), req.initial_email, req.follow_ups)
        .await?;
    Ok(ActionResponse::success(outcome.message).with_lead(outcome.lead))
}

pub async fn check_responses(State(state): State<AppState>) -> ApiResult<ActionResponse> {
    let outcome = state.orchestrator.check_responses().await?;
    Ok(ActionResponse::success(outcome.message).with_report(outcome.report))
}

// ── Read models ──

pub async fn tracking_report(State(state): State<AppState>) -> Json<TrackingReport> {
    Json(state.orchestrator.tracking_report())
}

pub async fn activity(State(state): State<AppState>) -> Json<ActivitySnapshot> {
    Json(state.orchestrator.activity())
}

pub async fn pending(State(state): State<AppState>) -> Json<Vec<InvocationRecord>> {
    Json(state.orchestrator.pending())
}

// ── Settings ──

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.read().clone())
}

pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> ApiResult<ActionResponse> {
    save_settings_to_path(&state.settings_path, &settings)?;
    *state.settings.write() = settings.clone();
    info!(path = %state.settings_path.display(), "settings updated");
    Ok(ActionResponse::success("Settings saved.").with_settings(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use leadflow_core::{AgentDirectory, LeadStatus};
    use leadflow_engine::{OutreachOrchestrator, SessionEventAggregator};
    use leadflow_gateway::{BroadcastEventSource, MockGateway, MockReply};
    use leadflow_store::LeadStore;
    use parking_lot::RwLock;
    use tower::ServiceExt;

    use crate::server::build_router;

    struct TestApp {
        router: Router,
        store: LeadStore,
        gateway: Arc<MockGateway>,
        _dir: tempfile::TempDir,
    }

    fn app(store: LeadStore, replies: Vec<MockReply>) -> TestApp {
        let gateway = Arc::new(MockGateway::new(replies));
        let activity = Arc::new(SessionEventAggregator::new(Arc::new(
            BroadcastEventSource::default(),
        )));
        let orchestrator = Arc::new(OutreachOrchestrator::new(
            gateway.clone(),
            store.clone(),
            activity,
            AgentDirectory::default(),
        ));
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            orchestrator,
            settings: Arc::new(RwLock::new(Settings::default())),
            settings_path: Arc::new(dir.path().join("settings.json")),
        };
        TestApp {
            router: build_router(state),
            store,
            gateway,
            _dir: dir,
        }
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn draft_reply() -> MockReply {
        MockReply::success(json!({"result": {
            "initial_email": {"subject": "Hello", "body": "Hi"},
            "follow_ups": [{"sequence_number": 1, "subject": "f", "body": "b", "send_after_days": 3}]
        }}))
    }

    #[tokio::test]
    async fn health_is_healthy() {
        let t = app(LeadStore::new(), vec![]);
        let (status, body) = call(&t.router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn agents_lists_three_roles() {
        let t = app(LeadStore::new(), vec![]);
        let (_, body) = call(&t.router, Method::GET, "/agents", None).await;
        let agents = body.as_array().unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0]["agentId"], "outreach-coordinator");
        assert_eq!(agents[0]["name"], "Outreach Coordinator");
        assert_eq!(agents[2]["role"], "tracking");
    }

    #[tokio::test]
    async fn add_then_get_and_remove() {
        let t = app(LeadStore::new(), vec![]);
        let (status, body) = call(
            &t.router,
            Method::POST,
            "/leads",
            Some(json!({"name": "Sarah Chen", "email": "sarah@techcorp.io", "company": "TechCorp"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "success");
        assert_eq!(body["text"], "Lead \"Sarah Chen\" added successfully.");
        let id = body["lead"]["id"].as_str().unwrap().to_string();

        let (status, lead) = call(&t.router, Method::GET, &format!("/leads/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lead["status"], "New");

        let (status, _) = call(&t.router, Method::DELETE, &format!("/leads/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&t.router, Method::GET, &format!("/leads/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"type": "error", "text": "Lead not found."}));
    }

    #[tokio::test]
    async fn add_without_email_is_bad_request() {
        let t = app(LeadStore::new(), vec![]);
        let (status, body) = call(
            &t.router,
            Method::POST,
            "/leads",
            Some(json!({"name": "Nobody", "email": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "error");
        assert!(t.store.is_empty());
    }

    #[tokio::test]
    async fn outreach_then_send() {
        let store = LeadStore::new();
        let lead = store
            .add(NewLead {
                name: "Marcus".into(),
                email: "marcus@x.io".into(),
                ..Default::default()
            })
            .unwrap();
        let t = app(
            store.clone(),
            vec![
                draft_reply(),
                MockReply::success(json!({"result": {"sent_email": {"recipient": "marcus@x.io"}}})),
            ],
        );

        let (status, body) = call(&t.router, Method::POST, &format!("/leads/{}/outreach", lead.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Outreach generated for Marcus. Review the draft below.");
        assert_eq!(body["lead"]["status"], "Draft Ready");

        let (status, body) = call(
            &t.router,
            Method::POST,
            &format!("/leads/{}/send", lead.id),
            Some(json!({"initial_email": {"subject": "Edited", "body": "Edited body"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Email sent to marcus@x.io.");
        assert_eq!(store.get(&lead.id).unwrap().status, LeadStatus::OutreachSent);
        assert!(t.gateway.calls()[1].message.contains("Subject: Edited."));
    }

    #[tokio::test]
    async fn gateway_refusal_is_bad_gateway() {
        let store = LeadStore::new();
        let lead = store
            .add(NewLead {
                name: "A".into(),
                email: "a@x.io".into(),
                ..Default::default()
            })
            .unwrap();
        let t = app(store, vec![MockReply::refused(Some("Research quota exhausted"))]);

        let (status, body) = call(&t.router, Method::POST, &format!("/leads/{}/outreach", lead.id), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"type": "error", "text": "Research quota exhausted"}));
    }

    #[tokio::test]
    async fn send_before_draft_is_conflict() {
        let store = LeadStore::new();
        let lead = store
            .add(NewLead {
                name: "A".into(),
                email: "a@x.io".into(),
                ..Default::default()
            })
            .unwrap();
        let t = app(store, vec![]);

        let (status, _) = call(&t.router, Method::POST, &format!("/leads/{}/send", lead.id), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(t.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn tracking_without_sent_leads_is_conflict() {
        let t = app(LeadStore::new(), vec![]);
        let (status, body) = call(&t.router, Method::POST, "/tracking/check", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["text"],
            "No outreach has been sent yet. Send emails first before checking responses."
        );
    }

    #[tokio::test]
    async fn tracking_check_updates_report() {
        let t = app(
            LeadStore::with_sample_data(),
            vec![MockReply::success(json!({"result": {
                "tracked_leads": [{"email": "marcus.w@innovatelabs.com", "status": "Bounced"}],
                "overall_summary": "One bounce"
            }}))],
        );

        let (status, body) = call(&t.router, Method::POST, "/tracking/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["overallSummary"], "One bounce");

        let (_, report) = call(&t.router, Method::GET, "/tracking", None).await;
        assert_eq!(report["metrics"]["bounced"], 1);
    }

    #[tokio::test]
    async fn edit_draft_validates_cadence() {
        let store = LeadStore::new();
        let lead = store
            .add(NewLead {
                name: "A".into(),
                email: "a@x.io".into(),
                ..Default::default()
            })
            .unwrap();
        let _ = store.apply_draft(&lead.id, Default::default()).unwrap();
        let t = app(store, vec![]);

        let uri = format!("/leads/{}/draft", lead.id);
        let (status, _) = call(
            &t.router,
            Method::PUT,
            &uri,
            Some(json!({
                "initial_email": {"subject": "s", "body": "b"},
                "follow_ups": [{"sequence_number": 1, "subject": "f", "body": "b", "send_after_days": 0}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &t.router,
            Method::PUT,
            &uri,
            Some(json!({"initial_email": {"subject": "s", "body": "b"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lead"]["outreachData"]["initial_email"]["subject"], "s");
    }

    #[tokio::test]
    async fn activity_and_pending_start_empty() {
        let t = app(LeadStore::new(), vec![]);
        let (_, snapshot) = call(&t.router, Method::GET, "/activity", None).await;
        assert_eq!(snapshot["isProcessing"], false);
        assert_eq!(snapshot["connected"], false);
        let (_, pending) = call(&t.router, Method::GET, "/pending", None).await;
        assert_eq!(pending, json!([]));
    }

    #[tokio::test]
    async fn settings_round_trip_through_disk() {
        let t = app(LeadStore::new(), vec![]);
        let (status, body) = call(
            &t.router,
            Method::PUT,
            "/settings",
            Some(json!({"senderName": "Jordan", "tone": "Friendly", "followUp1Days": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Settings saved.");

        let (_, settings) = call(&t.router, Method::GET, "/settings", None).await;
        assert_eq!(settings["senderName"], "Jordan");
        assert_eq!(settings["followUp2Days"], 7);

        let on_disk = leadflow_settings::load_settings_from_path(&t._dir.path().join("settings.json")).unwrap();
        assert_eq!(on_disk.sender_name, "Jordan");
    }

    #[tokio::test]
    async fn out_of_range_settings_are_rejected() {
        let t = app(LeadStore::new(), vec![]);
        let (status, _) = call(&t.router, Method::PUT, "/settings", Some(json!({"followUp1Days": 45}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, settings) = call(&t.router, Method::GET, "/settings", None).await;
        assert_eq!(settings["followUp1Days"], 3);
    }
}
