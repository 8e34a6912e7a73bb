use crate::core::app::{App, SessionContext, UiState};
use crate::ui::theme::Theme;
use crate::utils::logging::LoggingState;

/// Application state with a dummy session, for tests that never reach the
/// network.
pub fn create_test_app() -> App {
    let session = SessionContext {
        client: reqwest::Client::new(),
        model: "test-model".to_string(),
        api_key: "test-key".to_string(),
        base_url: "https://api.test.com".to_string(),
        target_language: "th".to_string(),
        logging: LoggingState::new(None).unwrap(),
        stream_cancel_token: None,
        current_stream_id: 0,
        pending_reply_index: None,
    };

    App {
        session,
        ui: UiState::new(Theme::dark_default()),
    }
}
