use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::constants;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("missing configuration: {0} is not set")]
    Configuration(&'static str),
    #[error("email API returned {0}")]
    Upstream(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One happiness rating plus a free-text comment; sent once, never retried,
/// never stored locally.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSubmission {
    pub happiness: u8,
    pub feedback: String,
}

impl FeedbackSubmission {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if !(1..=4).contains(&self.happiness) {
            return Err(FeedbackError::Invalid("happiness must be between 1 and 4"));
        }
        if self.feedback.trim().is_empty() {
            return Err(FeedbackError::Invalid("feedback comment must not be empty"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Escapes user-supplied text before it is interpolated into the email
/// body. The comment arrives unescaped over the wire and must never reach
/// the HTML template raw.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const HAPPINESS_LABELS: [&str; 4] = ["angry", "frowning", "smiling", "laughing"];

/// Renders the fixed dark-theme email body. Only validated submissions
/// reach this point; the comment and rating are escaped regardless.
pub fn render_email(submission: &FeedbackSubmission) -> String {
    let label = HAPPINESS_LABELS
        .get(submission.happiness.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("unrated");
    format!(
        "<html>\
          <style>\
            body {{ background-color: #121212; color: #fff; font-family: Arial, sans-serif; }}\
            h1 {{ color: #f0f0f0; }}\
            p {{ margin: 1em 0; }}\
          </style>\
          <body>\
            <h1>{subject}</h1>\
            <p>Rating: {happiness}/4 ({label})</p>\
            <p>{comment}</p>\
            <p>Received {received}</p>\
          </body>\
        </html>",
        subject = constants::FEEDBACK_SUBJECT,
        happiness = submission.happiness,
        label = label,
        comment = escape_html(&submission.feedback),
        received = Utc::now().format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Dispatches a feedback email through the hosted email API with static
/// sender and recipient addresses.
#[derive(Clone)]
pub struct FeedbackMailer {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl FeedbackMailer {
    pub fn new(http: Client, config: &RelayConfig) -> Self {
        Self {
            http,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
        }
    }

    pub async fn send(&self, submission: &FeedbackSubmission) -> Result<(), FeedbackError> {
        submission.validate()?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FeedbackError::Configuration("EMAIL_API_KEY"))?;

        let email = EmailRequest {
            from: constants::FEEDBACK_FROM.as_str(),
            to: constants::FEEDBACK_TO.as_str(),
            subject: constants::FEEDBACK_SUBJECT,
            html: render_email(submission),
        };

        let response = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(api_key)
            .json(&email)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "email API request failed");
            return Err(FeedbackError::Upstream(format!("{status}: {body}")));
        }

        info!(happiness = submission.happiness, "feedback dispatched");
        Ok(())
    }
}
