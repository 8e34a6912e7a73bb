//! Main chat event loop
//!
//! Owns the application state and drives everything from one task: drain
//! terminal events, drain service channels, apply the queued actions, then
//! execute whatever commands the reducers asked for.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand, UiMode,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::Config;
use crate::core::message::TranslationStyle;
use crate::core::translate::{TranslationMessage, TranslationService};
use crate::ui::renderer::ui;

pub async fn run_chat(
    model: Option<String>,
    lang: Option<String>,
    log: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    // Credentials are checked before the terminal is touched; a failure here
    // is fatal and must stay readable on stderr.
    let mut app = match App::new(&config, model, lang, log) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut terminal = setup_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Forward crossterm events over a channel so the main loop never blocks on
/// the terminal.
fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(ev).is_err() {
                            // Channel closed, exit
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                // No events available, yield to other tasks
                tokio::task::yield_now().await;
            }
        }
    })
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);

    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let (translation_service, mut translation_rx) = TranslationService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let result = loop {
        terminal.draw(|f| ui(f, app))?;

        let size = terminal.size()?;
        let ctx = AppActionContext {
            term_width: size.width,
            term_height: size.height,
        };

        let mut exit_requested = false;
        let mut received_any = false;

        while let Ok(ev) = event_rx.try_recv() {
            received_any = true;
            if let Event::Key(key) = ev {
                if handle_key_event(app, key, &dispatcher, ctx) {
                    exit_requested = true;
                    break;
                }
            }
        }

        if exit_requested {
            break Ok(());
        }

        received_any |= process_stream_updates(
            &dispatcher,
            &mut stream_rx,
            size.width,
            size.height,
            app.session.current_stream_id,
        );
        received_any |=
            process_translation_updates(&dispatcher, &mut translation_rx, size.width, size.height);
        received_any |= drain_action_queue(
            app,
            &stream_service,
            &translation_service,
            &mut action_rx,
        );

        if !received_any {
            tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS when idle
        }
    };

    app.conversation().cancel_current_stream();
    event_reader_handle.abort();
    result
}

/// Returns true when the user asked to quit.
fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    dispatcher: &AppActionDispatcher,
    ctx: AppActionContext,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.ui.mode.clone() {
        UiMode::Typing => handle_typing_key(app, key, dispatcher, ctx),
        UiMode::StylePicker {
            message_index,
            selected,
        } => handle_picker_key(app, key, dispatcher, ctx, message_index, selected),
    }
    false
}

fn handle_typing_key(
    app: &mut App,
    key: KeyEvent,
    dispatcher: &AppActionDispatcher,
    ctx: AppActionContext,
) {
    match key.code {
        KeyCode::Enter => {
            // The draft stays put while a reply is still streaming.
            if app.is_loading() || app.ui.input.trim().is_empty() {
                return;
            }
            let message = app.ui.take_input();
            dispatcher.dispatch(AppAction::SubmitMessage { message }, ctx);
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(index) = app.last_translatable_index() {
                app.ui.open_style_picker(index);
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.ui.insert_input_char(c);
        }
        KeyCode::Backspace => app.ui.backspace_input(),
        KeyCode::Left => app.ui.move_cursor_left(),
        KeyCode::Right => app.ui.move_cursor_right(),
        KeyCode::Up => app.ui.scroll_up(1),
        KeyCode::Down => {
            let conversation = app.conversation();
            let available_height = conversation.calculate_available_height(ctx.term_height);
            conversation.ui.scroll_down(1, available_height);
        }
        _ => {}
    }
}

fn handle_picker_key(
    app: &mut App,
    key: KeyEvent,
    dispatcher: &AppActionDispatcher,
    ctx: AppActionContext,
    message_index: usize,
    selected: usize,
) {
    let style_count = TranslationStyle::ALL.len();
    match key.code {
        KeyCode::Esc => app.ui.close_style_picker(),
        KeyCode::Up => {
            app.ui.mode = UiMode::StylePicker {
                message_index,
                selected: (selected + style_count - 1) % style_count,
            };
        }
        KeyCode::Down => {
            app.ui.mode = UiMode::StylePicker {
                message_index,
                selected: (selected + 1) % style_count,
            };
        }
        KeyCode::Left => {
            if let Some(previous) = app.translatable_index_before(message_index) {
                app.ui.mode = UiMode::StylePicker {
                    message_index: previous,
                    selected,
                };
            }
        }
        KeyCode::Right => {
            if let Some(next) = app.translatable_index_after(message_index) {
                app.ui.mode = UiMode::StylePicker {
                    message_index: next,
                    selected,
                };
            }
        }
        KeyCode::Enter => {
            dispatcher.dispatch(
                AppAction::RequestTranslation {
                    message_index,
                    style: TranslationStyle::ALL[selected],
                },
                ctx,
            );
            app.ui.close_style_picker();
        }
        _ => {}
    }
}

/// Drain the stream channel into actions. Adjacent fragments are coalesced
/// into one append so a chatty provider costs one redraw, not dozens.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    term_width: u16,
    term_height: u16,
    current_stream_id: u64,
) -> bool {
    let mut received_any = false;
    let mut coalesced = String::new();
    let mut followup_actions = Vec::new();

    while let Ok((message, msg_stream_id)) = rx.try_recv() {
        if msg_stream_id != current_stream_id {
            continue;
        }

        match message {
            StreamMessage::Fragment(content) => coalesced.push_str(&content),
            StreamMessage::Failed(detail) => followup_actions.push(AppAction::StreamErrored {
                message: detail,
                stream_id: msg_stream_id,
            }),
            StreamMessage::Completed => followup_actions.push(AppAction::StreamCompleted {
                stream_id: msg_stream_id,
            }),
        }

        received_any = true;
    }

    if !received_any {
        return false;
    }

    let ctx = AppActionContext {
        term_width,
        term_height,
    };

    let mut actions = Vec::with_capacity(1 + followup_actions.len());
    let fragment = std::mem::take(&mut coalesced);
    if !fragment.is_empty() {
        actions.push(AppAction::AppendReplyFragment {
            content: fragment,
            stream_id: current_stream_id,
        });
    }
    actions.extend(followup_actions);

    dispatcher.dispatch_many(actions, ctx);
    true
}

fn process_translation_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<TranslationMessage>,
    term_width: u16,
    term_height: u16,
) -> bool {
    let ctx = AppActionContext {
        term_width,
        term_height,
    };
    let mut received_any = false;

    while let Ok(message) = rx.try_recv() {
        let action = match message {
            TranslationMessage::Done {
                message_index,
                style,
                text,
            } => AppAction::TranslationCompleted {
                message_index,
                style,
                text,
            },
            TranslationMessage::Failed {
                message_index,
                style,
                error,
            } => AppAction::TranslationFailed {
                message_index,
                style,
                error,
            },
        };
        dispatcher.dispatch(action, ctx);
        received_any = true;
    }

    received_any
}

fn drain_action_queue(
    app: &mut App,
    stream_service: &ChatStreamService,
    translation_service: &TranslationService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = apply_actions(app, pending);
    for command in commands {
        match command {
            AppCommand::SpawnStream(params) => stream_service.spawn_stream(params),
            AppCommand::SpawnTranslation(params) => translation_service.spawn_translation(params),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::utils::test_utils::create_test_app;

    const TERM_WIDTH: u16 = 80;
    const TERM_HEIGHT: u16 = 24;

    fn test_ctx() -> AppActionContext {
        AppActionContext {
            term_width: TERM_WIDTH,
            term_height: TERM_HEIGHT,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[tokio::test]
    async fn stream_updates_become_actions_with_coalesced_fragments() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);
        let (service, mut rx) = ChatStreamService::new();

        service.send_for_test(StreamMessage::Fragment("Hel".to_string()), 42);
        service.send_for_test(StreamMessage::Fragment("lo".to_string()), 42);
        service.send_for_test(StreamMessage::Completed, 42);
        // tail of an older stream must be dropped at the drain
        service.send_for_test(StreamMessage::Fragment("ghost".to_string()), 41);

        let processed = process_stream_updates(&dispatcher, &mut rx, TERM_WIDTH, TERM_HEIGHT, 42);
        assert!(processed);

        let mut actions = Vec::new();
        while let Ok(envelope) = action_rx.try_recv() {
            actions.push(envelope.action);
        }
        assert_eq!(
            actions,
            vec![
                AppAction::AppendReplyFragment {
                    content: "Hello".to_string(),
                    stream_id: 42,
                },
                AppAction::StreamCompleted { stream_id: 42 },
            ]
        );
    }

    #[tokio::test]
    async fn translation_updates_become_actions() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);
        let (service, mut rx) = TranslationService::new();

        service.send_for_test(TranslationMessage::Done {
            message_index: 1,
            style: TranslationStyle::Formal,
            text: "ท้องฟ้าเป็นสีฟ้า".to_string(),
        });

        assert!(process_translation_updates(
            &dispatcher,
            &mut rx,
            TERM_WIDTH,
            TERM_HEIGHT
        ));

        let envelope = action_rx.try_recv().expect("expected one action");
        assert_eq!(
            envelope.action,
            AppAction::TranslationCompleted {
                message_index: 1,
                style: TranslationStyle::Formal,
                text: "ท้องฟ้าเป็นสีฟ้า".to_string(),
            }
        );
    }

    #[test]
    fn enter_submits_draft_only_when_idle() {
        let mut app = create_test_app();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        for c in "Hello".chars() {
            app.ui.insert_input_char(c);
        }
        handle_key_event(&mut app, press(KeyCode::Enter), &dispatcher, test_ctx());
        assert!(app.ui.input.is_empty());
        let envelope = action_rx.try_recv().expect("expected submit action");
        assert_eq!(
            envelope.action,
            AppAction::SubmitMessage {
                message: "Hello".to_string(),
            }
        );

        app.ui.begin_streaming();
        for c in "draft".chars() {
            app.ui.insert_input_char(c);
        }
        handle_key_event(&mut app, press(KeyCode::Enter), &dispatcher, test_ctx());
        assert_eq!(app.ui.input, "draft");
        assert!(action_rx.try_recv().is_err());
    }

    #[test]
    fn picker_selects_style_for_latest_reply() {
        let mut app = create_test_app();
        app.ui.messages.push_back(Message::user("Hello"));
        app.ui.messages.push_back(Message::model("Hi there!"));

        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        handle_key_event(&mut app, ctrl('t'), &dispatcher, test_ctx());
        assert!(matches!(
            app.ui.mode,
            UiMode::StylePicker {
                message_index: 1,
                selected: 0,
            }
        ));

        handle_key_event(&mut app, press(KeyCode::Down), &dispatcher, test_ctx());
        handle_key_event(&mut app, press(KeyCode::Enter), &dispatcher, test_ctx());

        assert!(matches!(app.ui.mode, UiMode::Typing));
        let envelope = action_rx.try_recv().expect("expected translation request");
        assert_eq!(
            envelope.action,
            AppAction::RequestTranslation {
                message_index: 1,
                style: TranslationStyle::WittyExpert,
            }
        );
    }

    #[test]
    fn picker_does_not_open_without_a_finished_reply() {
        let mut app = create_test_app();
        app.ui.messages.push_back(Message::user("Hello"));

        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        handle_key_event(&mut app, ctrl('t'), &dispatcher, test_ctx());
        assert!(matches!(app.ui.mode, UiMode::Typing));
    }

    #[test]
    fn picker_selection_wraps_and_esc_closes() {
        let mut app = create_test_app();
        app.ui.messages.push_back(Message::user("Hello"));
        app.ui.messages.push_back(Message::model("Hi there!"));
        app.ui.open_style_picker(1);

        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        handle_key_event(&mut app, press(KeyCode::Up), &dispatcher, test_ctx());
        assert!(matches!(
            app.ui.mode,
            UiMode::StylePicker {
                message_index: 1,
                selected: 4,
            }
        ));

        handle_key_event(&mut app, press(KeyCode::Esc), &dispatcher, test_ctx());
        assert!(matches!(app.ui.mode, UiMode::Typing));
    }

    #[test]
    fn arrow_keys_scroll_the_transcript_while_typing() {
        let mut app = create_test_app();
        for i in 0..30 {
            app.ui.messages.push_back(Message::user(format!("line {i}")));
        }
        app.ui.scroll_offset = 5;

        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        handle_key_event(&mut app, press(KeyCode::Up), &dispatcher, test_ctx());
        assert_eq!(app.ui.scroll_offset, 4);
        assert!(!app.ui.auto_scroll);

        handle_key_event(&mut app, press(KeyCode::Down), &dispatcher, test_ctx());
        assert_eq!(app.ui.scroll_offset, 5);
        assert!(!app.ui.auto_scroll);
    }

    #[tokio::test]
    async fn drained_actions_mutate_state_and_spawn_work() {
        let mut app = create_test_app();
        app.ui.messages.push_back(Message::user("Hello"));
        app.ui.messages.push_back(Message::model("Hi there!"));

        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);
        let (stream_service, _stream_rx) = ChatStreamService::new();
        let (translation_service, _translation_rx) = TranslationService::new();

        dispatcher.dispatch(
            AppAction::RequestTranslation {
                message_index: 1,
                style: TranslationStyle::Formal,
            },
            test_ctx(),
        );

        assert!(drain_action_queue(
            &mut app,
            &stream_service,
            &translation_service,
            &mut action_rx
        ));
        assert!(app.ui.messages[1].is_translating());
    }
}
