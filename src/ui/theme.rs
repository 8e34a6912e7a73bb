use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub model_text_style: Style,
    pub translation_label_style: Style,
    pub translation_text_style: Style,
    pub translation_pending_style: Style,
    pub error_text_style: Style,

    // Chrome
    pub title_style: Style,
    pub streaming_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,

    // Style picker overlay
    pub picker_border_style: Style,
    pub picker_title_style: Style,
    pub picker_item_style: Style,
    pub picker_selected_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            model_text_style: Style::default().fg(Color::White),
            translation_label_style: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            translation_text_style: Style::default().fg(Color::Yellow),
            translation_pending_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            error_text_style: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),

            title_style: Style::default().fg(Color::Gray),
            streaming_indicator_style: Style::default().fg(Color::White),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            input_text_style: Style::default().fg(Color::White),

            picker_border_style: Style::default().fg(Color::Cyan),
            picker_title_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            picker_item_style: Style::default().fg(Color::White),
            picker_selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn light() -> Self {
        Theme {
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            model_text_style: Style::default().fg(Color::Black),
            translation_label_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            translation_text_style: Style::default().fg(Color::Magenta),
            translation_pending_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            error_text_style: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),

            title_style: Style::default().fg(Color::DarkGray),
            streaming_indicator_style: Style::default().fg(Color::Black),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),
            input_text_style: Style::default().fg(Color::Black),

            picker_border_style: Style::default().fg(Color::Blue),
            picker_title_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            picker_item_style: Style::default().fg(Color::Black),
            picker_selected_style: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn dracula() -> Self {
        Theme {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Magenta),
            model_text_style: Style::default().fg(Color::Gray),
            translation_label_style: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            translation_text_style: Style::default().fg(Color::Green),
            translation_pending_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            error_text_style: Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),

            title_style: Style::default().fg(Color::LightMagenta),
            streaming_indicator_style: Style::default().fg(Color::LightMagenta),
            input_border_style: Style::default().fg(Color::LightMagenta),
            input_title_style: Style::default().fg(Color::LightMagenta),
            input_text_style: Style::default().fg(Color::White),

            picker_border_style: Style::default().fg(Color::LightMagenta),
            picker_title_style: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            picker_item_style: Style::default().fg(Color::White),
            picker_selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dark" | "default" | "default-dark" => Self::dark_default(),
            "light" => Self::light(),
            "dracula" => Self::dracula(),
            // Fallback
            _ => Self::dark_default(),
        }
    }
}
