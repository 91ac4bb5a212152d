//! Wire shapes for operation results.
//!
//! Every mutating endpoint answers `{ "type": "success"|"error", "text": ... }`,
//! plus the affected entity where there is one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

use leadflow_core::{Lead, TrackingReport};
use leadflow_engine::EngineError;
use leadflow_settings::{Settings, SettingsError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Success,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TrackingReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl ActionResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Success,
            text: text.into(),
            lead: None,
            report: None,
            settings: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Error,
            ..Self::success(text)
        }
    }

    pub fn with_lead(mut self, lead: Lead) -> Self {
        self.lead = Some(lead);
        self
    }

    pub fn with_report(mut self, report: TrackingReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A failed operation, rendered as an error [`ActionResponse`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub text: String,
}

impl ApiError {
    pub fn bad_request(text: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "validation",
            text: text.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::LeadNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Busy { .. }
            | EngineError::InvalidTransition { .. }
            | EngineError::NoEligibleTargets => StatusCode::CONFLICT,
            EngineError::GatewayFailure { .. } => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            kind: e.error_kind(),
            text: e.user_message(),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::InvalidValue(msg) => Self::bad_request(msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: "settings",
                text: format!("Failed to save settings: {other}"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), kind = self.kind, text = %self.text, "request failed");
        } else {
            debug!(status = self.status.as_u16(), kind = self.kind, text = %self.text, "request rejected");
        }
        (self.status, Json(ActionResponse::error(self.text))).into_response()
    }
}
