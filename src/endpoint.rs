use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument};

use crate::constants;
use crate::error::TurnError;
use crate::reply::InboundReply;

/// The remote service answering one message with a structured reply.
#[async_trait]
pub trait ChatEndpoint: Send + Sync + 'static {
    /// Sends the trimmed user message and returns the parsed reply.
    async fn send(&self, message: &str) -> Result<InboundReply, TurnError>;
}

/// Connection settings for [`HttpChatEndpoint`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    /// Bearer token; `None` sends no Authorization header.
    pub token: Option<String>,
    /// Request body field carrying the message text.
    pub message_field: String,
    /// Static fields merged into every request body (e.g. `llm_mode`).
    pub extra_fields: Map<String, Value>,
    pub timeout: Duration,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            message_field: constants::DEFAULT_MESSAGE_FIELD.to_string(),
            extra_fields: Map::new(),
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Settings taken from `PARLEY_*` environment variables.
    pub fn from_env() -> Self {
        let token = Some(constants::CHAT_TOKEN.clone()).filter(|t| !t.is_empty());
        Self {
            token,
            message_field: constants::MESSAGE_FIELD.clone(),
            ..Self::new(constants::CHAT_URL.clone())
        }
    }
}

/// JSON-over-HTTP chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatEndpoint {
    client: Client,
    config: EndpointConfig,
}

impl HttpChatEndpoint {
    pub fn new(config: EndpointConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn request_body(&self, message: &str) -> Value {
        let mut body = self.config.extra_fields.clone();
        body.insert(
            self.config.message_field.clone(),
            Value::String(message.to_string()),
        );
        Value::Object(body)
    }
}

#[async_trait]
impl ChatEndpoint for HttpChatEndpoint {
    #[instrument(skip(self, message), fields(url = %self.config.url))]
    async fn send(&self, message: &str) -> Result<InboundReply, TurnError> {
        let mut request = self.client.post(&self.config.url).json(&self.request_body(message));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Chat request did not complete");
            TurnError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Chat endpoint returned an error status");
            return Err(TurnError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TurnError::Transport(e.to_string()))?;
        let reply = parse_reply(&body).map_err(|e| {
            error!(error = %e, "Chat reply is not a JSON object");
            e
        })?;

        debug!(?reply, "Received chat reply");
        Ok(reply)
    }
}

// Struct deserialization would also accept a JSON array positionally, so the
// object shape is checked first.
fn parse_reply(body: &str) -> Result<InboundReply, TurnError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TurnError::MalformedReply(e.to_string()))?;
    if !value.is_object() {
        return Err(TurnError::MalformedReply(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| TurnError::MalformedReply(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
