//! Server configuration, read from environment variables at startup.

use std::path::PathBuf;

/// Every field has a default, so the server starts with no environment set.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP address to bind (default: `"127.0.0.1:8080"`).
    pub bind_address: String,
    /// SQLite file holding the `users` table (default: `"chatdesk.sqlite"`).
    pub database_path: PathBuf,
    /// Completion endpoint the proxy forwards to.
    pub upstream_url: String,
    /// Bearer key added to forwarded requests. Never sent to clients.
    pub api_key: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("CHATDESK_BIND", "127.0.0.1:8080"),
            database_path: PathBuf::from(env_or("CHATDESK_DB", "chatdesk.sqlite")),
            upstream_url: env_or("CHATDESK_UPSTREAM", "https://api.openai.com/v1/chat/completions"),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
