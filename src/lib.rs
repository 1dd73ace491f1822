pub mod attachment;
pub mod chat;
pub mod completion;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod feedback;
pub mod weather;
pub mod web_server;
