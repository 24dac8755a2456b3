//! Transcript display widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use roleverse_core::{parse_markup, Entry, MessageKind};

use crate::ui::theme::GameTheme;

/// Widget for displaying the story transcript
pub struct NarrativeWidget<'a> {
    entries: &'a [Entry],
    scroll: usize,
    theme: &'a GameTheme,
    focused: bool,
    animating: bool,
}

impl<'a> NarrativeWidget<'a> {
    pub fn new(entries: &'a [Entry], theme: &'a GameTheme) -> Self {
        Self {
            entries,
            scroll: 0,
            theme,
            focused: false,
            animating: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Draw a cursor after the entry still being revealed.
    pub fn animating(mut self, animating: bool) -> Self {
        self.animating = animating;
        self
    }

    fn entry_lines(&self, entry: &Entry) -> Vec<Line<'static>> {
        let kind = entry.message().kind;
        let base = self.theme.message_style(kind);

        let prefix = match kind {
            MessageKind::PlayerInput => "> ",
            MessageKind::System => "[ ",
            MessageKind::Error => "! ",
            MessageKind::Narration => "",
        };

        let mut lines: Vec<Line<'static>> = parse_markup(&entry.markup())
            .into_iter()
            .map(|markup_line| {
                let mut spans = Vec::with_capacity(markup_line.segments.len() + 1);
                if markup_line.list_item {
                    spans.push(Span::styled("  • ", base));
                }
                spans.extend(
                    markup_line
                        .segments
                        .into_iter()
                        .map(|seg| Span::styled(seg.text, self.theme.markup_style(base, seg.style))),
                );
                Line::from(spans)
            })
            .collect();

        if let Some(first) = lines.first_mut() {
            first.spans.insert(0, Span::styled(prefix, base));
        }
        if kind == MessageKind::System {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::styled(" ]", base));
            }
        }
        if self.animating && !entry.is_complete() {
            if let Some(last) = lines.last_mut() {
                last.spans
                    .push(Span::styled("▌", base.add_modifier(Modifier::DIM)));
            }
        }
        lines
    }
}

impl Widget for NarrativeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Story [j/k scroll] "
        } else {
            " Story "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        for entry in self.entries {
            lines.extend(self.entry_lines(entry));
            // Add blank line between entries
            lines.push(Line::from(""));
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .scroll((scroll.min(u16::MAX as usize) as u16, 0))
            .wrap(Wrap { trim: false });

        paragraph.render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);

            let hint_style = Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM);
            if scroll > 0 {
                write_hint(buf, inner, inner.y, &format!(" ↑{scroll} "), hint_style);
            }
            if scroll < max_scroll {
                let remaining = max_scroll - scroll;
                let bottom = inner.y + inner.height.saturating_sub(1);
                write_hint(buf, inner, bottom, &format!(" ↓{remaining} more "), hint_style);
            }
        }
    }
}

fn write_hint(buf: &mut Buffer, inner: Rect, y: u16, hint: &str, style: Style) {
    for (i, ch) in hint.chars().enumerate() {
        let x = inner.x + (i as u16);
        if x < inner.x + inner.width.saturating_sub(2) {
            buf[(x, y)].set_char(ch).set_style(style);
        }
    }
}
