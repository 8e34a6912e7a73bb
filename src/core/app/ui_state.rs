use std::collections::VecDeque;
use std::time::Instant;

use ratatui::text::{Line, Span};

use crate::core::message::Message;
use crate::ui::theme::Theme;

/// Current UI interaction mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMode {
    /// Default typing mode for composing new messages.
    Typing,

    /// Choosing a translation style for a model message.
    StylePicker {
        /// Index of the message the translation is requested for.
        message_index: usize,
        /// Position of the highlighted entry in the fixed style list.
        selected: usize,
    },
}

pub struct UiState {
    pub messages: VecDeque<Message>,
    pub input: String,
    /// Cursor position in characters, not bytes.
    pub input_cursor_position: usize,
    pub mode: UiMode,
    /// Most recent failure text; a new failure replaces it.
    pub error: Option<String>,
    pub is_streaming: bool,
    pub pulse_start: Instant,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub theme: Theme,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        Self {
            messages: VecDeque::new(),
            input: String::new(),
            input_cursor_position: 0,
            mode: UiMode::Typing,
            error: None,
            is_streaming: false,
            pulse_start: Instant::now(),
            scroll_offset: 0,
            auto_scroll: true,
            theme,
        }
    }

    pub fn begin_streaming(&mut self) {
        self.is_streaming = true;
        self.pulse_start = Instant::now();
    }

    pub fn end_streaming(&mut self) {
        self.is_streaming = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn input_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.input_cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert_input_char(&mut self, c: char) {
        let idx = self.input_byte_index();
        self.input.insert(idx, c);
        self.input_cursor_position += 1;
    }

    pub fn backspace_input(&mut self) {
        if self.input_cursor_position == 0 {
            return;
        }
        self.input_cursor_position -= 1;
        let idx = self.input_byte_index();
        self.input.remove(idx);
    }

    pub fn move_cursor_left(&mut self) {
        self.input_cursor_position = self.input_cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let len = self.input.chars().count();
        if self.input_cursor_position < len {
            self.input_cursor_position += 1;
        }
    }

    pub fn take_input(&mut self) -> String {
        self.input_cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    pub fn open_style_picker(&mut self, message_index: usize) {
        self.mode = UiMode::StylePicker {
            message_index,
            selected: 0,
        };
    }

    pub fn close_style_picker(&mut self) {
        self.mode = UiMode::Typing;
    }

    /// Render the transcript as styled lines: user turns with a `You:`
    /// prefix, model turns plain, each completed translation under its style
    /// label, and an in-flight marker while one is pending.
    pub fn build_display_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for msg in &self.messages {
            if msg.is_user() {
                lines.push(Line::from(vec![
                    Span::styled("You: ", self.theme.user_prefix_style),
                    Span::styled(msg.content.clone(), self.theme.user_text_style),
                ]));
                lines.push(Line::from(""));
                continue;
            }

            if !msg.content.is_empty() {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        self.theme.model_text_style,
                    )));
                }
            }

            for (style, text) in &msg.translations {
                lines.push(Line::from(Span::styled(
                    format!("[{}]", style.label()),
                    self.theme.translation_label_style,
                )));
                for text_line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        text_line.to_string(),
                        self.theme.translation_text_style,
                    )));
                }
            }

            if let Some(style) = msg.translating_style {
                lines.push(Line::from(Span::styled(
                    format!("… translating ({})", style.label()),
                    self.theme.translation_pending_style,
                )));
            }

            if !msg.content.is_empty() || !msg.translations.is_empty() || msg.is_translating() {
                lines.push(Line::from(""));
            }
        }

        lines
    }

    pub fn max_scroll_offset(&self, available_height: u16) -> u16 {
        let total_lines = self.build_display_lines().len() as u16;
        total_lines.saturating_sub(available_height)
    }

    pub fn autoscroll_to_bottom(&mut self, available_height: u16) {
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll_offset(available_height);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16, available_height: u16) {
        let max = self.max_scroll_offset(available_height);
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max);
        if self.scroll_offset >= max {
            self.auto_scroll = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TranslationStyle;

    #[test]
    fn input_editing_is_char_boundary_safe() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.insert_input_char('ท');
        ui.insert_input_char('ฟ');
        ui.move_cursor_left();
        ui.insert_input_char('้');
        assert_eq!(ui.input, "ท้ฟ");

        ui.move_cursor_right();
        ui.backspace_input();
        assert_eq!(ui.input, "ท้");
        assert_eq!(ui.input_cursor_position, 2);
    }

    #[test]
    fn take_input_resets_cursor() {
        let mut ui = UiState::new(Theme::dark_default());
        for c in "hello".chars() {
            ui.insert_input_char(c);
        }
        assert_eq!(ui.take_input(), "hello");
        assert!(ui.input.is_empty());
        assert_eq!(ui.input_cursor_position, 0);
    }

    #[test]
    fn latest_error_replaces_prior() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.set_error("first failure");
        ui.set_error("second failure");
        assert_eq!(ui.error.as_deref(), Some("second failure"));
    }

    #[test]
    fn display_lines_include_translations_and_pending_marker() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.messages.push_back(Message::user("Hello"));
        let mut reply = Message::model("Hi there!");
        reply
            .translations
            .insert(TranslationStyle::Formal, "สวัสดี".to_string());
        reply.translating_style = Some(TranslationStyle::FriendlyChat);
        ui.messages.push_back(reply);

        let rendered: Vec<String> = ui
            .build_display_lines()
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect();

        assert!(rendered.contains(&"You: Hello".to_string()));
        assert!(rendered.contains(&"Hi there!".to_string()));
        assert!(rendered.contains(&"[Formal]".to_string()));
        assert!(rendered.contains(&"สวัสดี".to_string()));
        assert!(rendered.contains(&"… translating (Friendly Chat)".to_string()));
    }

    #[test]
    fn empty_placeholder_renders_nothing() {
        let mut ui = UiState::new(Theme::dark_default());
        ui.messages.push_back(Message::model_placeholder());
        assert!(ui.build_display_lines().is_empty());
    }
}
