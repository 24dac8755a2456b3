//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use roleverse_core::MessageKind;

use crate::ui::theme::GameTheme;

/// Input field widget
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a GameTheme,
    title: &'a str,
    placeholder: &'a str,
    is_active: bool,
    is_command_mode: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a GameTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            title: "",
            placeholder: "",
            is_active: true,
            is_command_mode: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    /// What the field is asking for, shown on the border.
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn command_mode(mut self, is_command: bool) -> Self {
        self.is_command_mode = is_command;
        self
    }
}

/// Split `text` around the character at `cursor`. Past the end the cursor
/// sits on a blank cell.
fn split_at_cursor(text: &str, cursor: usize) -> (String, String, String) {
    let before = text.chars().take(cursor).collect();
    let at = text
        .chars()
        .nth(cursor)
        .map(String::from)
        .unwrap_or_else(|| " ".to_string());
    let after = text.chars().skip(cursor + 1).collect();
    (before, at, after)
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));
        if !self.title.is_empty() {
            block = block.title(format!(" {} ", self.title));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let prompt_style = self.theme.message_style(MessageKind::PlayerInput);

        let line = if self.content.is_empty() && !self.is_command_mode {
            Line::from(vec![
                Span::styled("> ", prompt_style),
                Span::styled(
                    self.placeholder,
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        } else {
            // Command mode keeps the leading ':' in the buffer but draws it
            // as the prompt.
            let (prefix, text, cursor) = match self.content.strip_prefix(':') {
                Some(rest) if self.is_command_mode => {
                    (":", rest, self.cursor_position.saturating_sub(1))
                }
                _ => ("> ", self.content, self.cursor_position),
            };
            let (before, at, after) = split_at_cursor(text, cursor);

            let mut spans = vec![Span::styled(prefix, prompt_style), Span::raw(before)];
            if self.is_active {
                spans.push(Span::styled(
                    at,
                    Style::default()
                        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                        .fg(self.theme.player_text),
                ));
            } else {
                spans.push(Span::raw(at));
            }
            spans.push(Span::raw(after));
            Line::from(spans)
        };

        Paragraph::new(line).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_cursor() {
        assert_eq!(
            split_at_cursor("héllo", 1),
            ("h".to_string(), "é".to_string(), "llo".to_string())
        );
        assert_eq!(
            split_at_cursor("go", 2),
            ("go".to_string(), " ".to_string(), String::new())
        );
    }

    #[test]
    fn test_renders_command_prompt() {
        let theme = GameTheme::default();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        InputWidget::new(":save", &theme)
            .command_mode(true)
            .render(area, &mut buf);

        let row: String = (0..area.width)
            .map(|x| buf[(x, 1)].symbol().to_string())
            .collect();
        assert!(row.contains(":save"));
    }
}
