//! Client configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the retrieval backend, without trailing slash
    pub api_url: String,
    /// Per-request timeout. `None` waits for the backend indefinitely.
    pub request_timeout: Option<Duration>,
    /// File the JSON log is written to (the terminal UI owns stdout)
    pub log_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests don't touch the process env
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("WIKI_CHAT_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = lookup("WIKI_CHAT_REQUEST_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let log_path = lookup("WIKI_CHAT_LOG_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.wiki-chat/wiki-chat.log"))
            },
            PathBuf::from,
        );

        Self {
            api_url,
            request_timeout,
            log_path,
        }
    }
}
