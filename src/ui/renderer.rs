use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::core::app::{App, UiMode};
use crate::core::message::{Message, TranslationStyle};

pub fn ui(f: &mut Frame, app: &App) {
    let error_height = if app.ui.error.is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(error_height),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(app.ui.theme.background_color)),
        f.area(),
    );

    let lines = app.ui.build_display_lines();
    let available_height = chunks[0].height.saturating_sub(1); // Account for title
    let max_offset = (lines.len() as u16).saturating_sub(available_height);
    let scroll_offset = app.ui.scroll_offset.min(max_offset);

    let title = format!(
        "Chatoyer v{} - {} → {} • Logging: {}",
        env!("CARGO_PKG_VERSION"),
        app.session.model,
        app.session.target_language,
        app.session.logging.get_status_string()
    );

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(Span::styled(title, app.ui.theme.title_style)))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    if let Some(error) = &app.ui.error {
        let banner = Paragraph::new(error.as_str()).style(app.ui.theme.error_text_style);
        f.render_widget(banner, chunks[1]);
    }

    let input_title = if app.ui.is_streaming {
        "Type your message (reply streaming, Ctrl+C to quit)"
    } else {
        "Type your message (Enter to send, Ctrl+T to translate, Ctrl+C to quit)"
    };

    // Keep the cursor column visible when the draft outgrows the box.
    let inner_width = chunks[2].width.saturating_sub(2);
    let cursor_col = app.ui.input_cursor_position as u16;
    let input_scroll_x = cursor_col.saturating_sub(inner_width.saturating_sub(1));

    let input = Paragraph::new(app.ui.input.as_str())
        .style(app.ui.theme.input_text_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.ui.theme.input_border_style)
                .title(Span::styled(input_title, app.ui.theme.input_title_style)),
        )
        .scroll((0, input_scroll_x));
    f.render_widget(input, chunks[2]);

    if app.ui.is_streaming {
        render_pulse(f, app, chunks[2]);
    }

    if matches!(app.ui.mode, UiMode::Typing) {
        let cursor_x = chunks[2].x + 1 + cursor_col.saturating_sub(input_scroll_x);
        let max_x = chunks[2].x + chunks[2].width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), chunks[2].y + 1));
    }

    if let UiMode::StylePicker {
        message_index,
        selected,
    } = app.ui.mode
    {
        render_style_picker(f, app, message_index, selected);
    }
}

/// Pulse indicator in the bottom-right corner of the input box while a reply
/// is streaming.
fn render_pulse(f: &mut Frame, app: &App, input_area: Rect) {
    // 0.0 to 1.0 and back, two cycles per second
    let elapsed = app.ui.pulse_start.elapsed().as_millis() as f32 / 1000.0;
    let phase = (elapsed * 2.0) % 2.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };

    let symbol = if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    };

    if input_area.width > 3 && input_area.height > 1 {
        let corner = Rect::new(input_area.x + input_area.width - 3, input_area.y + 1, 1, 1);
        f.render_widget(
            Paragraph::new(symbol).style(app.ui.theme.streaming_indicator_style),
            corner,
        );
    }
}

fn render_style_picker(f: &mut Frame, app: &App, message_index: usize, selected: usize) {
    let width = 44u16.min(f.area().width.saturating_sub(4));
    let height = (TranslationStyle::ALL.len() as u16 + 2).min(f.area().height.saturating_sub(2));
    let x = f.area().x + f.area().width.saturating_sub(width) / 2;
    let y = f.area().y + f.area().height.saturating_sub(height) / 2;
    let area = Rect::new(x, y, width, height);

    let reply_number = app
        .ui
        .messages
        .iter()
        .take(message_index + 1)
        .filter(|m| m.is_model())
        .count();
    let title = format!(
        "Translate reply {} into {}",
        reply_number, app.session.target_language
    );

    let message = app.ui.messages.get(message_index);
    let items: Vec<ListItem> = TranslationStyle::ALL
        .iter()
        .enumerate()
        .map(|(i, style)| {
            let item_style = if i == selected {
                app.ui.theme.picker_selected_style
            } else {
                app.ui.theme.picker_item_style
            };
            ListItem::new(Line::from(Span::styled(
                style_entry_text(*style, message),
                item_style,
            )))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.ui.theme.picker_border_style)
        .title(Span::styled(title, app.ui.theme.picker_title_style));

    f.render_widget(Clear, area);
    f.render_widget(List::new(items).block(block), area);
}

/// Picker row text: the style label, a check for a translation already on
/// the message, an ellipsis for the one in flight.
fn style_entry_text(style: TranslationStyle, message: Option<&Message>) -> String {
    let mut text = format!(" {}", style.label());
    if let Some(msg) = message {
        if msg.has_translation(style) {
            text.push_str(" ✓");
        } else if msg.translating_style == Some(style) {
            text.push_str(" …");
        }
    }
    text.push(' ');
    text
}
