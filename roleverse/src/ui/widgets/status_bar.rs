//! Status and hotkey bars

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use roleverse_core::{ConnectionStatus, Phase};

use crate::app::InputMode;
use crate::ui::theme::GameTheme;

/// One-line summary: mode, phase, request state, connection and the latest
/// status message.
pub struct StatusBarWidget<'a> {
    phase: Phase,
    input_mode: InputMode,
    connection: ConnectionStatus,
    busy: bool,
    offline: bool,
    message: Option<&'a str>,
    theme: &'a GameTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(phase: Phase, input_mode: InputMode, theme: &'a GameTheme) -> Self {
        Self {
            phase,
            input_mode,
            connection: ConnectionStatus::Unknown,
            busy: false,
            offline: false,
            message: None,
            theme,
        }
    }

    pub fn connection(mut self, connection: ConnectionStatus) -> Self {
        self.connection = connection;
        self
    }

    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

fn mode_span(mode: InputMode) -> Span<'static> {
    let (label, color) = match mode {
        InputMode::Normal => (" NORMAL ", Color::Blue),
        InputMode::Insert => (" INSERT ", Color::Green),
        InputMode::Command => (" COMMAND ", Color::Magenta),
    };
    Span::styled(
        label,
        Style::default()
            .bg(color)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            mode_span(self.input_mode),
            Span::raw(" "),
            Span::styled(self.phase.label(), Style::default().add_modifier(Modifier::BOLD)),
        ];

        if self.busy {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled("waiting for server", self.theme.selected_style()));
        }

        spans.push(Span::raw(" | "));
        if self.offline {
            spans.push(Span::styled(
                "offline play",
                self.theme.connection_style(ConnectionStatus::Unreachable),
            ));
        } else {
            spans.push(Span::styled(
                self.connection.to_string(),
                self.theme.connection_style(self.connection),
            ));
        }

        if let Some(message) = self.message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                message.to_string(),
                Style::default().fg(self.theme.foreground),
            ));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Key hints for the current mode and phase
pub struct HotkeyBarWidget {
    phase: Phase,
    input_mode: InputMode,
    menu_active: bool,
}

impl HotkeyBarWidget {
    pub fn new(phase: Phase, input_mode: InputMode) -> Self {
        Self {
            phase,
            input_mode,
            menu_active: false,
        }
    }

    pub fn menu_active(mut self, active: bool) -> Self {
        self.menu_active = active;
        self
    }

    fn hints(&self) -> &'static str {
        match self.input_mode {
            InputMode::Insert => "Enter send | Esc normal | ↑/↓ history",
            InputMode::Command => "Enter run | Esc cancel | :save :load :new :status :q",
            InputMode::Normal if self.menu_active => {
                "↑/↓ choose | 1-4 pick | Enter confirm | ? help | q quit"
            }
            InputMode::Normal => match self.phase {
                Phase::Ended => ":new start over | :load restore | ? help | q quit",
                _ => "i type | Space skip | j/k scroll | : command | ? help | q quit",
            },
        }
    }
}

impl Widget for HotkeyBarWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(Span::styled(
            self.hints(),
            Style::default().add_modifier(Modifier::DIM),
        ));
        Paragraph::new(line).render(area, buf);
    }
}
