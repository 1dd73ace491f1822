use std::env;

/// Upstream endpoints and credentials, read once at startup.
///
/// Base URLs are overridable so tests can point the relay at a local mock
/// server. A missing key is not fatal here; the operation that needs it
/// fails with a configuration error when it is actually invoked.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub completion_api_url: String,
    pub completion_api_key: Option<String>,
    pub weather_api_url: String,
    pub weather_api_key: Option<String>,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            completion_api_url: env::var("COMPLETION_API_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            completion_api_key: env::var("COMPLETION_API_KEY").ok(),
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            weather_api_key: env::var("WEATHER_API_KEY").ok(),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").ok(),
        }
    }
}
