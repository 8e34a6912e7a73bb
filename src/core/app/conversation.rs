use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::app::session::SessionContext;
use crate::core::app::ui_state::UiState;
use crate::core::message::Message;

/// Instruction prepended to every chat request.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful and friendly conversational AI. Be concise but informative.";

/// Level of indirection over session plus UI state for conversation flow
/// operations that touch both.
pub struct ConversationController<'a> {
    pub session: &'a mut SessionContext,
    pub ui: &'a mut UiState,
}

impl<'a> ConversationController<'a> {
    pub fn new(session: &'a mut SessionContext, ui: &'a mut UiState) -> Self {
        Self { session, ui }
    }

    /// Record a user message and an empty placeholder for the reply, then
    /// snapshot the API history to send. The history carries the system
    /// instruction first and excludes the placeholder.
    pub fn add_user_message(&mut self, content: String) -> Vec<ChatMessage> {
        self.ui.clear_error();

        if let Err(e) = self.session.logging.log_message(&format!("You: {content}")) {
            eprintln!("Warning: Failed to log message: {e}");
        }

        self.ui.messages.push_back(Message::user(content));
        self.ui.messages.push_back(Message::model_placeholder());
        let placeholder_index = self.ui.messages.len() - 1;
        self.session.pending_reply_index = Some(placeholder_index);

        let mut api_messages = vec![ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_INSTRUCTION.to_string(),
        }];
        for (i, msg) in self.ui.messages.iter().enumerate() {
            if i == placeholder_index {
                continue;
            }
            api_messages.push(ChatMessage {
                role: msg.role.to_api_role().to_string(),
                content: msg.content.clone(),
            });
        }
        api_messages
    }

    /// Append a streamed fragment to the pending reply.
    pub fn append_to_reply(&mut self, fragment: &str, available_height: u16) {
        let Some(index) = self.session.pending_reply_index else {
            return;
        };
        if let Some(msg) = self.ui.messages.get_mut(index) {
            if msg.is_model() {
                msg.content.push_str(fragment);
            }
        }
        self.ui.autoscroll_to_bottom(available_height);
    }

    /// Mark the pending reply complete and log it.
    pub fn finalize_reply(&mut self) {
        if let Some(index) = self.session.pending_reply_index.take() {
            if let Some(msg) = self.ui.messages.get(index) {
                if msg.is_model() && !msg.content.is_empty() {
                    if let Err(e) = self.session.logging.log_message(&msg.content) {
                        eprintln!("Warning: Failed to log message: {e}");
                    }
                }
            }
        }
        self.ui.end_streaming();
    }

    /// Drop the pending reply placeholder after a stream failure. The user
    /// message that prompted it stays in the transcript.
    pub fn discard_pending_reply(&mut self) {
        if let Some(index) = self.session.pending_reply_index.take() {
            if index < self.ui.messages.len() {
                self.ui.messages.remove(index);
            }
        }
        self.ui.end_streaming();
    }

    pub fn cancel_current_stream(&mut self) {
        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
        }
    }

    /// Cancel any stream in flight and hand out a token and id for the next
    /// one. Replies tagged with an older id are ignored after this.
    pub fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.cancel_current_stream();
        self.session.current_stream_id += 1;
        let token = CancellationToken::new();
        self.session.stream_cancel_token = Some(token.clone());
        self.ui.begin_streaming();
        (token, self.session.current_stream_id)
    }

    /// Transcript rows left after the title line, the input box, and the
    /// error banner when one is showing.
    pub fn calculate_available_height(&self, term_height: u16) -> u16 {
        let mut height = term_height.saturating_sub(4);
        if self.ui.error.is_some() {
            height = height.saturating_sub(1);
        }
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;

    #[test]
    fn add_user_message_snapshots_history_with_system_first() {
        let mut app = create_test_app();
        let mut conversation = app.conversation();
        let api_messages = conversation.add_user_message("Hello".to_string());

        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[1].content, "Hello");

        assert_eq!(conversation.ui.messages.len(), 2);
        assert!(conversation.ui.messages[1].is_model());
        assert!(conversation.ui.messages[1].content.is_empty());
        assert_eq!(conversation.session.pending_reply_index, Some(1));
    }

    #[test]
    fn second_turn_history_includes_prior_reply_as_assistant() {
        let mut app = create_test_app();
        {
            let mut conversation = app.conversation();
            conversation.add_user_message("Hello".to_string());
            conversation.append_to_reply("Hi there!", 20);
            conversation.finalize_reply();
        }
        let mut conversation = app.conversation();
        let api_messages = conversation.add_user_message("How are you?".to_string());

        let roles: Vec<&str> = api_messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(api_messages[2].content, "Hi there!");
    }

    #[test]
    fn append_targets_pending_reply() {
        let mut app = create_test_app();
        let mut conversation = app.conversation();
        conversation.add_user_message("Hello".to_string());
        conversation.append_to_reply("Hi", 20);
        conversation.append_to_reply(" there!", 20);
        assert_eq!(conversation.ui.messages[1].content, "Hi there!");
    }

    #[test]
    fn discard_removes_placeholder_and_keeps_user_message() {
        let mut app = create_test_app();
        let mut conversation = app.conversation();
        conversation.add_user_message("Hello".to_string());
        conversation.discard_pending_reply();

        assert_eq!(conversation.ui.messages.len(), 1);
        assert!(conversation.ui.messages[0].is_user());
        assert_eq!(conversation.session.pending_reply_index, None);
        assert!(!conversation.ui.is_streaming);
    }

    #[test]
    fn start_new_stream_increments_id_and_stores_token() {
        let mut app = create_test_app();
        let mut conversation = app.conversation();
        let (_, first) = conversation.start_new_stream();
        let (_, second) = conversation.start_new_stream();
        assert_eq!(second, first + 1);
        assert!(conversation.session.stream_cancel_token.is_some());
        assert!(conversation.ui.is_streaming);
    }
}
