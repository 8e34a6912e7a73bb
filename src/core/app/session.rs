use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::utils::logging::LoggingState;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider handle plus the in-flight stream bookkeeping.
///
/// Created once at startup. If credentials are missing the constructor fails
/// and the terminal UI never starts; nothing recreates the session later.
pub struct SessionContext {
    pub client: Client,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub target_language: String,
    pub logging: LoggingState,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
    /// Index of the model message the open stream appends into.
    pub pending_reply_index: Option<usize>,
}

impl SessionContext {
    pub fn from_env(
        config: &Config,
        model_override: Option<String>,
        lang_override: Option<String>,
        log_file: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            "Failed to initialize the chat session. Please check your API key.

Set your credentials first:
export OPENAI_API_KEY=\"your-api-key-here\"
export OPENAI_BASE_URL=\"https://api.openai.com/v1\"  # Optional"
        })?;

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = model_override
            .filter(|m| !m.trim().is_empty())
            .or_else(|| config.default_model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let target_language = lang_override
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| config.target_language().to_string());

        let logging = LoggingState::new(log_file)?;

        Ok(SessionContext {
            client: Client::new(),
            model,
            api_key,
            base_url,
            target_language,
            logging,
            stream_cancel_token: None,
            current_stream_id: 0,
            pending_reply_index: None,
        })
    }
}
