use std::time::{Duration, Instant};

use async_trait::async_trait;
use leadflow_core::{AgentGateway, AgentId, AgentReply, GatewayError};
use leadflow_settings::GatewaySettings;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "x-api-key";

/// [`AgentGateway`] over plain HTTP: one `POST {message, agent_id}` per
/// invocation, answered by a single JSON reply envelope.
pub struct HttpAgentGateway {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    request_timeout: Option<Duration>,
}

impl HttpAgentGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().connect_timeout(settings.connect_timeout());
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.as_ref().map(|k| k.0.clone()),
            request_timeout: settings.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.request_timeout.unwrap_or_default())
        } else {
            GatewayError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    #[instrument(skip(self, message), fields(agent_id = %agent_id, message_len = message.len()))]
    async fn invoke(&self, message: &str, agent_id: &AgentId) -> Result<AgentReply, GatewayError> {
        let started = Instant::now();
        let body = json!({
            "message": message,
            "agent_id": agent_id.as_str(),
        });

        let mut req = self.client.post(&self.base_url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key.expose_secret());
        }

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| GatewayError::MalformedReply(e.to_string()))?;
        let reply = AgentReply::from_value(&value);

        debug!(
            success = reply.success,
            session_id = reply.session_id.as_ref().map(|s| s.as_str()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "agent replied"
        );
        Ok(reply)
    }
}
