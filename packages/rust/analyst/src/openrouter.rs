//! OpenRouter (OpenAI-compatible) chat completions client.

use std::time::Duration;

use parcel_shared::{AnalystConfig, AppConfig, ParcelError, Result, validate_api_key};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Analyst;
use crate::extract::extract_json;

/// User-Agent string for analyst requests.
const USER_AGENT: &str = concat!("Parcel/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body quoted back in an error message.
const MAX_ERROR_BODY: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`Analyst`] backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenRouterClient {
    /// Build a client from the `[analyst]` section and an API key.
    pub fn new(config: &AnalystConfig, api_key: impl Into<String>) -> Result<Self> {
        let base = config.base_url()?;
        let endpoint = format!("{}/chat/completions", base.as_str().trim_end_matches('/'));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParcelError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build a client from the full config, reading the key from the environment.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let key = validate_api_key(config)?;
        Self::new(&config.analyst, key)
    }

    /// Model ID sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system+user exchange and return the reply text.
    async fn complete(&self, role: &str, prompt: &str, json_mode: bool) -> Result<String> {
        let system = format!("You are {role}.");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ParcelError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet = &body[..floor_char_boundary(&body, MAX_ERROR_BODY)];
            return Err(ParcelError::Network(format!(
                "{}: HTTP {status}: {snippet}",
                self.endpoint
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ParcelError::parse(format!("invalid completion payload: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ParcelError::Estimation("empty completion".into()))?;

        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

/// Largest index `<= max` that sits on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Append the expected JSON shape to a prompt.
fn json_prompt(prompt: &str, example: &str) -> String {
    format!(
        "{prompt}\n\nRespond with a single JSON object and nothing else. \
         Use exactly these keys; the values shown are placeholders:\n{example}"
    )
}

impl Analyst for OpenRouterClient {
    #[instrument(skip_all, fields(role = %role, model = %self.model))]
    async fn generate_json<T>(&self, role: &str, prompt: &str, example: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let example = serde_json::to_string_pretty(example)
            .map_err(|e| ParcelError::parse(format!("failed to serialize schema: {e}")))?;
        let full_prompt = json_prompt(prompt, &example);
        debug!(prompt = %full_prompt, "requesting JSON completion");

        let text = self.complete(role, &full_prompt, true).await?;
        let body = extract_json(&text)
            .ok_or_else(|| ParcelError::Estimation("completion contained no JSON object".into()))?;

        serde_json::from_str(body)
            .map_err(|e| ParcelError::parse(format!("completion did not match schema: {e}")))
    }

    #[instrument(skip_all, fields(role = %role, model = %self.model))]
    async fn generate_response(&self, role: &str, prompt: &str) -> Result<String> {
        debug!(prompt, "requesting text completion");
        self.complete(role, prompt, false).await
    }
}
