use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::attachment::Attachment;
use crate::completion::CompletionClient;
use crate::config::RelayConfig;
use crate::conversation::Message;
use crate::feedback::{FeedbackMailer, FeedbackSubmission};
use crate::weather::{self, WeatherSnapshot};

// Shared application state
#[derive(Clone)]
struct AppState {
    templates: Arc<AutoReloader>,
    config: Arc<RelayConfig>,
    http: reqwest::Client,
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<AutoReloader> {
    // Use AutoReloader for development convenience
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        // Watch the templates directory for changes
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "MintCode AI",
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

struct CompletionForm {
    prompt: String,
    image: Option<Attachment>,
    history: Vec<Message>,
}

// Multipart form fields: `prompt` (text), `image` (optional binary part
// with an image/* content type), `messageHistory` (JSON array of turns).
async fn read_completion_form(mut multipart: Multipart) -> Result<CompletionForm, String> {
    let mut prompt = String::new();
    let mut image = None;
    let mut history = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed form body: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => {
                prompt = field
                    .text()
                    .await
                    .map_err(|e| format!("unreadable prompt field: {e}"))?;
            }
            "image" => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("unreadable image field: {e}"))?;
                image = Some(Attachment::new(&mime, bytes.to_vec()).map_err(|e| e.to_string())?);
            }
            "messageHistory" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| format!("unreadable messageHistory field: {e}"))?;
                history = serde_json::from_str(&raw)
                    .map_err(|e| format!("malformed messageHistory: {e}"))?;
            }
            _ => {}
        }
    }

    if prompt.trim().is_empty() && image.is_none() {
        return Err("Please enter a message or upload an image.".to_string());
    }

    Ok(CompletionForm {
        prompt,
        image,
        history,
    })
}

async fn completion_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_completion_form(multipart).await {
        Ok(form) => form,
        Err(notice) => {
            warn!(%notice, "rejected completion submission");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": notice })));
        }
    };

    let client = CompletionClient::new(state.http.clone(), &state.config);
    let data_url = form.image.as_ref().map(|attachment| attachment.data_url());
    match client
        .complete(&form.prompt, data_url.as_deref(), &form.history)
        .await
    {
        Ok(message) => (StatusCode::OK, Json(json!({ "message": message }))),
        Err(e) => {
            error!("The completion relay encountered an error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to process the request",
                    "details": e.to_string(),
                })),
            )
        }
    }
}

async fn feedback_handler(
    State(state): State<AppState>,
    Json(submission): Json<FeedbackSubmission>,
) -> impl IntoResponse {
    if let Err(e) = submission.validate() {
        warn!("rejected feedback submission: {e}");
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })));
    }

    let mailer = FeedbackMailer::new(state.http.clone(), &state.config);
    match mailer.send(&submission).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => {
            error!("Error submitting feedback: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to submit feedback",
                    "details": e.to_string(),
                })),
            )
        }
    }
}

// The weather key stays server-side; the page asks the relay instead of the
// provider. A fetch failure is already logged and collapses to JSON null,
// which the card renders as nothing.
async fn weather_handler(State(state): State<AppState>) -> Json<Option<WeatherSnapshot>> {
    Json(weather::fetch_weather(&state.http, &state.config).await)
}

/// Builds the application router; split out so tests can drive it without
/// binding a socket.
pub fn build_router(config: Arc<RelayConfig>) -> Result<Router> {
    let templates = create_minijinja_env().context("Failed to initialize template engine")?;

    let state = AppState {
        templates: Arc::new(templates),
        config,
        http: reqwest::Client::new(),
    };

    Ok(Router::new()
        .route("/", get(index_handler))
        .route("/completion", post(completion_handler))
        .route("/feedback", post(feedback_handler))
        .route("/weather", get(weather_handler))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        // Image uploads are accepted whole, whatever their size.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http()))
}

pub async fn start_web_server(port: u16, config: Arc<RelayConfig>) -> Result<()> {
    let app = build_router(config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Web server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Ctrl-C received, initiating shutdown...");
}
