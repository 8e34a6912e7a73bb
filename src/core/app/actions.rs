use tokio::sync::mpsc;
use tracing::debug;

use crate::core::app::App;
use crate::core::chat_stream::StreamParams;
use crate::core::message::TranslationStyle;
use crate::core::translate::TranslationParams;

/// Something the application should react to: either a user intent or the
/// completion of background work.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Submit the composed message and request a streamed reply.
    SubmitMessage { message: String },
    /// A streamed fragment arrived for the reply in progress.
    AppendReplyFragment { content: String, stream_id: u64 },
    /// The stream failed before completing.
    StreamErrored { message: String, stream_id: u64 },
    /// The stream finished cleanly.
    StreamCompleted { stream_id: u64 },
    /// Ask for a translation of a model message in the given style.
    RequestTranslation {
        message_index: usize,
        style: TranslationStyle,
    },
    /// A translation request finished with text.
    TranslationCompleted {
        message_index: usize,
        style: TranslationStyle,
        text: String,
    },
    /// A translation request failed.
    TranslationFailed {
        message_index: usize,
        style: TranslationStyle,
        error: String,
    },
}

/// Terminal geometry captured when the action was queued, so reducers can do
/// scroll math without touching the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

#[derive(Debug, Clone)]
pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

/// Cloneable handle for queueing actions from tasks and event handlers.
#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, context: AppActionContext) {
        let envelope = AppActionEnvelope { action, context };
        if self.tx.send(envelope).is_err() {
            debug!("action channel closed, dropping action");
        }
    }

    pub fn dispatch_many<I>(&self, actions: I, context: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions {
            self.dispatch(action, context);
        }
    }
}

/// Side effect a reducer asks the main loop to perform.
pub enum AppCommand {
    SpawnStream(StreamParams),
    SpawnTranslation(TranslationParams),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(command) = apply_action(app, envelope.action, envelope.context) {
            commands.push(command);
        }
    }
    commands
}

/// Apply one action to the application state. Pure with respect to the
/// terminal: any work that needs IO comes back as an [`AppCommand`].
pub fn apply_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => handle_submit_message(app, message),
        AppAction::AppendReplyFragment { content, stream_id } => {
            if !app.is_current_stream(stream_id) {
                debug!(stream_id, "ignoring fragment from stale stream");
                return None;
            }
            let available_height = {
                let conversation = app.conversation();
                conversation.calculate_available_height(ctx.term_height)
            };
            app.conversation().append_to_reply(&content, available_height);
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            if !app.is_current_stream(stream_id) {
                debug!(stream_id, "ignoring error from stale stream");
                return None;
            }
            handle_stream_error(app, message);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            if !app.is_current_stream(stream_id) {
                debug!(stream_id, "ignoring completion of stale stream");
                return None;
            }
            app.conversation().finalize_reply();
            None
        }
        AppAction::RequestTranslation {
            message_index,
            style,
        } => handle_request_translation(app, message_index, style),
        AppAction::TranslationCompleted {
            message_index,
            style,
            text,
        } => {
            handle_translation_completed(app, message_index, style, text);
            None
        }
        AppAction::TranslationFailed {
            message_index,
            style,
            error,
        } => {
            handle_translation_failed(app, message_index, style, error);
            None
        }
    }
}

fn handle_submit_message(app: &mut App, message: String) -> Option<AppCommand> {
    if app.is_loading() {
        return None;
    }
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    let content = trimmed.to_string();

    let (api_messages, cancel_token, stream_id) = {
        let mut conversation = app.conversation();
        let api_messages = conversation.add_user_message(content);
        let (cancel_token, stream_id) = conversation.start_new_stream();
        (api_messages, cancel_token, stream_id)
    };

    Some(AppCommand::SpawnStream(app.build_stream_params(
        api_messages,
        cancel_token,
        stream_id,
    )))
}

fn handle_stream_error(app: &mut App, detail: String) {
    app.conversation().discard_pending_reply();
    app.ui
        .set_error(format!("Error generating response: {detail}"));
}

fn handle_request_translation(
    app: &mut App,
    message_index: usize,
    style: TranslationStyle,
) -> Option<AppCommand> {
    // A reply still streaming has no final text to translate.
    if app.ui.is_streaming && app.session.pending_reply_index == Some(message_index) {
        return None;
    }

    let source_text = {
        let msg = app.ui.messages.get_mut(message_index)?;
        if !msg.is_model() || msg.content.is_empty() {
            return None;
        }
        if msg.has_translation(style) || msg.is_translating() {
            debug!(
                message_index,
                style = style.as_str(),
                "translation already present or in flight"
            );
            return None;
        }
        msg.translating_style = Some(style);
        msg.content.clone()
    };

    // An accepted request dismisses any failure still on the banner.
    app.ui.clear_error();

    Some(AppCommand::SpawnTranslation(TranslationParams {
        client: app.session.client.clone(),
        base_url: app.session.base_url.clone(),
        api_key: app.session.api_key.clone(),
        model: app.session.model.clone(),
        source_text,
        target_language: app.session.target_language.clone(),
        style,
        message_index,
    }))
}

fn handle_translation_completed(
    app: &mut App,
    message_index: usize,
    style: TranslationStyle,
    text: String,
) {
    let Some(msg) = app.ui.messages.get_mut(message_index) else {
        return;
    };
    // First completed text for a style wins; a finished translation is never
    // replaced.
    msg.translations.entry(style).or_insert(text);
    if msg.translating_style == Some(style) {
        msg.translating_style = None;
    }
}

fn handle_translation_failed(
    app: &mut App,
    message_index: usize,
    style: TranslationStyle,
    error: String,
) {
    if let Some(msg) = app.ui.messages.get_mut(message_index) {
        if msg.translating_style == Some(style) {
            msg.translating_style = None;
        }
    }
    app.ui.set_error(format!("Translation failed: {error}"));
}

// Reducer behavior is covered in core::app::tests alongside the rest of the
// application state machine.
