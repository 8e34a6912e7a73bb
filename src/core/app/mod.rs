pub mod actions;
pub mod conversation;
pub mod session;
pub mod ui_state;


pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use conversation::{ConversationController, SYSTEM_INSTRUCTION};
pub use session::SessionContext;
pub use ui_state::{UiMode, UiState};

use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::chat_stream::StreamParams;
use crate::core::config::Config;
use crate::ui::theme::Theme;

/// Top-level application state: one session, one UI.
pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    pub fn new(
        config: &Config,
        model_override: Option<String>,
        lang_override: Option<String>,
        log_file: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = SessionContext::from_env(config, model_override, lang_override, log_file)?;
        let theme = Theme::from_name(config.theme.as_deref().unwrap_or("dark"));
        Ok(Self {
            session,
            ui: UiState::new(theme),
        })
    }

    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.session, &mut self.ui)
    }

    /// True while a reply stream is open. Submits are ignored until the
    /// stream settles one way or the other.
    pub fn is_loading(&self) -> bool {
        self.ui.is_streaming
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session.current_stream_id == stream_id
    }

    pub fn build_stream_params(
        &self,
        api_messages: Vec<ChatMessage>,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) -> StreamParams {
        StreamParams {
            client: self.session.client.clone(),
            base_url: self.session.base_url.clone(),
            api_key: self.session.api_key.clone(),
            model: self.session.model.clone(),
            api_messages,
            cancel_token,
            stream_id,
        }
    }

    /// Whether the message at `index` can be offered for translation: a
    /// model message whose text is final.
    pub fn is_translatable(&self, index: usize) -> bool {
        if self.ui.is_streaming && self.session.pending_reply_index == Some(index) {
            return false;
        }
        self.ui
            .messages
            .get(index)
            .map(|msg| msg.is_model() && !msg.content.is_empty())
            .unwrap_or(false)
    }

    pub fn last_translatable_index(&self) -> Option<usize> {
        (0..self.ui.messages.len())
            .rev()
            .find(|&i| self.is_translatable(i))
    }

    pub fn translatable_index_before(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| self.is_translatable(i))
    }

    pub fn translatable_index_after(&self, index: usize) -> Option<usize> {
        ((index + 1)..self.ui.messages.len()).find(|&i| self.is_translatable(i))
    }
}
