use std::io::{self, Write as _};
use std::path::Path;

use anyhow::Result;
use chrono::Local;
use tracing::info;

use crate::attachment::Attachment;
use crate::completion::CompletionClient;
use crate::config::RelayConfig;
use crate::constants;
use crate::conversation::{Conversation, Message};
use crate::weather;

/// Submission lifecycle. A finished submission always lands back in Idle,
/// success or not, so the user can type again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

/// Single-writer state container for one chat session: the transcript, the
/// current phase, the staged attachment and the last error notice. All
/// mutation goes through the methods below; there are no loose flags that
/// could disagree with each other.
#[derive(Debug)]
pub struct ChatSession {
    pub conversation: Conversation,
    phase: Phase,
    pending_image: Option<Attachment>,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            conversation: Conversation::new(),
            phase: Phase::Idle,
            pending_image: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_image(&self) -> Option<&Attachment> {
        self.pending_image.as_ref()
    }

    /// Stages an image for the next submission, replacing any previous one.
    pub fn attach_image(&mut self, attachment: Attachment) {
        self.pending_image = Some(attachment);
    }

    pub fn discard_image(&mut self) {
        self.pending_image = None;
    }

    /// Validates the input and appends the optimistic user turn. The staged
    /// attachment is cleared immediately and handed back so the caller can
    /// still build the outbound request from it.
    ///
    /// Rejected submissions leave the session untouched.
    pub fn begin_submission(&mut self, prompt: &str) -> Result<Option<Attachment>, &'static str> {
        if self.phase == Phase::Submitting {
            return Err("A submission is already in flight.");
        }
        if prompt.trim().is_empty() && self.pending_image.is_none() {
            return Err("Please enter a message or upload an image.");
        }

        let image = self.pending_image.take();
        let message = match &image {
            Some(attachment) => Message::user_with_image(prompt, attachment.data_url()),
            None => Message::user(prompt),
        };
        self.conversation.push(message);
        self.last_error = None;
        self.phase = Phase::Submitting;
        Ok(image)
    }

    /// The history an in-flight submission forwards upstream: every turn
    /// before the optimistic one. The prompt itself travels separately.
    pub fn history(&self) -> &[Message] {
        let messages = self.conversation.messages();
        &messages[..messages.len().saturating_sub(1)]
    }

    /// Success: the reply becomes the assistant turn; back to Idle.
    pub fn complete_submission(&mut self, reply: impl Into<String>) {
        self.conversation.push(Message::assistant(reply));
        self.phase = Phase::Idle;
    }

    /// Failure: the optimistic user turn stays in place (no rollback), a
    /// notice is recorded, and the session returns to Idle so the user can
    /// resubmit.
    pub fn fail_submission(&mut self, notice: impl Into<String>) {
        self.last_error = Some(notice.into());
        self.phase = Phase::Idle;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Interactive terminal chat against the hosted completion API.
/// `:image <path>` stages an attachment for the next message, `:quit`
/// leaves. One submission is in flight at a time; the loop simply blocks
/// on it, matching the single-flight rule of the browser screen.
pub async fn run_chat(config: &RelayConfig) -> Result<()> {
    let http = reqwest::Client::new();
    let client = CompletionClient::new(http.clone(), config);
    let mut session = ChatSession::new();
    info!(session = %session.conversation.id, "starting chat session");

    if let Some(snapshot) = weather::fetch_weather(&http, config).await {
        println!(
            "{}: {:.0}\u{b0}C, {} (humidity {}%)",
            constants::WEATHER_LOCATION.as_str(),
            snapshot.temperature,
            snapshot.description,
            snapshot.humidity
        );
    }
    println!("Welcome to MintCode AI. Ask a question or attach an image.");
    println!("Commands: :image <path>, :quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();

        if line == ":quit" {
            break;
        }
        if let Some(path) = line.strip_prefix(":image") {
            let path = path.trim();
            if path.is_empty() {
                println!("Usage: :image <path>");
                continue;
            }
            match Attachment::from_path(Path::new(path)) {
                Ok(attachment) => {
                    println!("[{}] attached {} ({})", timestamp(), path, attachment.mime());
                    session.attach_image(attachment);
                }
                Err(e) => println!("{e}"),
            }
            continue;
        }

        let image = match session.begin_submission(line) {
            Ok(image) => image,
            Err(notice) => {
                println!("{notice}");
                continue;
            }
        };
        let data_url = image.as_ref().map(|attachment| attachment.data_url());

        let result = client
            .complete(line, data_url.as_deref(), session.history())
            .await;
        match result {
            Ok(reply) => {
                println!("[{}] MintCode AI: {}", timestamp(), reply);
                session.complete_submission(reply);
            }
            Err(e) => {
                println!("[{}] error: {}", timestamp(), e);
                session.fail_submission(e.to_string());
            }
        }
    }

    info!(
        session = %session.conversation.id,
        turns = session.conversation.len(),
        "chat session finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn hello_submission_appends_user_then_assistant() {
        let mut session = ChatSession::new();
        let image = session.begin_submission("Hello").unwrap();
        assert!(image.is_none());
        assert_eq!(session.phase(), Phase::Submitting);
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation.messages()[0].role, Role::User);
        assert_eq!(session.conversation.messages()[0].content, "Hello");

        session.complete_submission("Hi! How can I help?");
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.conversation.len(), 2);
        assert_eq!(session.conversation.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn empty_submission_is_rejected_without_state_change() {
        let mut session = ChatSession::new();
        assert!(session.begin_submission("   ").is_err());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.conversation.is_empty());
    }

    #[test]
    fn image_only_submission_is_allowed() {
        let mut session = ChatSession::new();
        session.attach_image(Attachment::new("image/png", vec![1, 2, 3]).unwrap());

        let image = session.begin_submission("").unwrap();
        assert!(image.is_some());
        assert!(session.pending_image().is_none(), "attachment is cleared on submit");
        let user_turn = &session.conversation.messages()[0];
        assert!(user_turn.image.as_deref().unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn failure_keeps_user_turn_and_returns_to_idle() {
        let mut session = ChatSession::new();
        session.begin_submission("Hello").unwrap();
        session.fail_submission("transport failure: connection refused");

        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.conversation.len(), 1, "no assistant turn, no rollback");
        assert!(session.last_error().unwrap().contains("transport failure"));

        // The session accepts a resubmission afterwards.
        assert!(session.begin_submission("Hello").is_ok());
    }

    #[test]
    fn resubmission_grows_conversation_by_two_per_success() {
        let mut session = ChatSession::new();
        for round in 1..=3 {
            session.begin_submission("Same question").unwrap();
            session.complete_submission("Same answer");
            assert_eq!(session.conversation.len(), round * 2);
        }
    }

    #[test]
    fn second_submission_while_in_flight_is_rejected() {
        let mut session = ChatSession::new();
        session.begin_submission("first").unwrap();
        assert!(session.begin_submission("second").is_err());
        assert_eq!(session.conversation.len(), 1);
    }

    #[test]
    fn history_excludes_the_in_flight_turn() {
        let mut session = ChatSession::new();
        session.begin_submission("Hello").unwrap();
        session.complete_submission("Hi!");
        session.begin_submission("And again").unwrap();

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Hello");
        assert_eq!(history[1].content, "Hi!");
    }

    #[test]
    fn success_clears_previous_error_notice() {
        let mut session = ChatSession::new();
        session.begin_submission("Hello").unwrap();
        session.fail_submission("boom");
        assert!(session.last_error().is_some());

        session.begin_submission("Hello").unwrap();
        assert!(session.last_error().is_none(), "notice cleared on resubmit");
        session.complete_submission("Hi!");
        assert_eq!(session.conversation.len(), 4);
    }
}
