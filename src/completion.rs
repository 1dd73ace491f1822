use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::RelayConfig;
use crate::constants;
use crate::conversation::{Message, Role};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing configuration: {0} is not set")]
    Configuration(&'static str),
    #[error("upstream returned an unusable response: {0}")]
    Upstream(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

// Structures matching the hosted chat/completions endpoint.
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<OutboundMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OutboundMessage {
    pub role: &'static str,
    pub content: OutboundContent,
}

/// Plain text for ordinary turns, a part array for the one multimodal turn.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OutboundContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Past turns travel as text only. The model considers just the most
/// recently uploaded image, so historical image references are dropped
/// here rather than shipped upstream.
pub fn sanitize_history(history: &[Message]) -> Vec<OutboundMessage> {
    history
        .iter()
        .map(|message| OutboundMessage {
            role: role_str(message.role),
            content: OutboundContent::Text(message.content.clone()),
        })
        .collect()
}

/// Assembles the outbound message array: persona instruction, sanitized
/// history, then the current turn. Image presence selects the model
/// variant and the persona wording.
pub fn build_request(
    prompt: &str,
    image_data_url: Option<&str>,
    history: &[Message],
) -> CompletionRequest {
    let (model, persona) = match image_data_url {
        Some(_) => (constants::VISION_MODEL.clone(), constants::PERSONA_VISION),
        None => (constants::TEXT_MODEL.clone(), constants::PERSONA_TEXT),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(OutboundMessage {
        role: "system",
        content: OutboundContent::Text(persona.to_string()),
    });
    messages.extend(sanitize_history(history));
    let current = match image_data_url {
        Some(url) => OutboundContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: url.to_string(),
                },
            },
        ]),
        None => OutboundContent::Text(prompt.to_string()),
    };
    messages.push(OutboundMessage {
        role: "user",
        content: current,
    });

    CompletionRequest {
        model,
        messages,
        temperature: constants::TEMPERATURE,
        max_tokens: constants::MAX_TOKENS,
        top_p: constants::TOP_P,
    }
}

/// Client for the hosted OpenAI-compatible completion endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl CompletionClient {
    pub fn new(http: Client, config: &RelayConfig) -> Self {
        Self {
            http,
            api_url: config.completion_api_url.clone(),
            api_key: config.completion_api_key.clone(),
        }
    }

    /// One attempt, no retry. Returns the first completion choice's text.
    #[instrument(skip_all, fields(history_len = history.len(), has_image = image_data_url.is_some()))]
    pub async fn complete(
        &self,
        prompt: &str,
        image_data_url: Option<&str>,
        history: &[Message],
    ) -> Result<String, RelayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RelayError::Configuration("COMPLETION_API_KEY"))?;

        let request = build_request(prompt, image_data_url, history);
        debug!(model = %request.model, "issuing completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(%status, %body, "completion API request failed");
            return Err(RelayError::Upstream(format!(
                "completion API returned {status}: {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("unparseable completion payload: {e}")))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(RelayError::Upstream(
                "no message content in completion response".to_string(),
            ));
        }

        debug!(reply_len = reply.len(), "received completion reply");
        Ok(reply.trim().to_string())
    }
}
