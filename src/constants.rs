// Fixed wording and tunables, overridable through the environment.

use std::env;

lazy_static::lazy_static! {
    /// Model used for plain text turns.
    pub static ref TEXT_MODEL: String =
        env::var("MINTCHAT_TEXT_MODEL").unwrap_or_else(|_| "llama3-8b-8192".to_string());
    /// Vision-capable model, selected when the current turn carries an image.
    pub static ref VISION_MODEL: String =
        env::var("MINTCHAT_VISION_MODEL").unwrap_or_else(|_| "llava-v1.5-7b-4096-preview".to_string());
    /// Location the weather card is pinned to.
    pub static ref WEATHER_LOCATION: String =
        env::var("MINTCHAT_WEATHER_LOCATION").unwrap_or_else(|_| "Pakistan".to_string());
    pub static ref FEEDBACK_FROM: String =
        env::var("MINTCHAT_FEEDBACK_FROM").unwrap_or_else(|_| "ai@mintchat.example".to_string());
    pub static ref FEEDBACK_TO: String =
        env::var("MINTCHAT_FEEDBACK_TO").unwrap_or_else(|_| "feedback@mintchat.example".to_string());
}

// The persona line changes with image presence so the model does not invent
// commentary about images that were never part of the current turn.
pub const PERSONA_TEXT: &str = "You are a helpful assistant named MintCode AI. \
    The user has not uploaded an image with this message, so answer from the text \
    alone and do not comment on any image.";
pub const PERSONA_VISION: &str = "You are a helpful assistant named MintCode AI. \
    The user has uploaded an image with this message; describe it or answer \
    questions about it as asked.";

pub const FEEDBACK_SUBJECT: &str = "Feedback | MintCode AI";

// Sampling knobs for the completion API.
pub const TEMPERATURE: f32 = 1.0;
pub const MAX_TOKENS: u32 = 4096;
pub const TOP_P: f32 = 1.0;
