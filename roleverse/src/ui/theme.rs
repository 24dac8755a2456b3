//! Color theme and styling for the RoleVerse TUI

use ratatui::style::{Color, Modifier, Style};

use roleverse_core::{ConnectionStatus, MessageKind, TextStyle};

/// Game UI color theme
#[derive(Debug, Clone)]
pub struct GameTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,

    // HP colors
    pub hp_healthy: Color,
    pub hp_wounded: Color,
    pub hp_critical: Color,

    // Transcript colors
    pub narration_text: Color,
    pub player_text: Color,
    pub system_text: Color,
    pub error_text: Color,
    pub code_text: Color,

    // Connection colors
    pub online: Color,
    pub degraded: Color,
    pub offline: Color,
}

impl Default for GameTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            accent: Color::Yellow,

            hp_healthy: Color::Green,
            hp_wounded: Color::Yellow,
            hp_critical: Color::Red,

            narration_text: Color::White,
            player_text: Color::Cyan,
            system_text: Color::DarkGray,
            error_text: Color::LightRed,
            code_text: Color::LightGreen,

            online: Color::Green,
            degraded: Color::Yellow,
            offline: Color::Red,
        }
    }
}

impl GameTheme {
    /// Base style for a transcript entry
    pub fn message_style(&self, kind: MessageKind) -> Style {
        match kind {
            MessageKind::Narration => Style::default().fg(self.narration_text),
            MessageKind::PlayerInput => Style::default()
                .fg(self.player_text)
                .add_modifier(Modifier::ITALIC),
            MessageKind::System => Style::default()
                .fg(self.system_text)
                .add_modifier(Modifier::DIM),
            MessageKind::Error => Style::default().fg(self.error_text),
        }
    }

    /// Layer inline markup on top of a base style
    pub fn markup_style(&self, base: Style, style: TextStyle) -> Style {
        let mut out = base;
        if style.bold {
            out = out.add_modifier(Modifier::BOLD);
        }
        if style.italic {
            out = out.add_modifier(Modifier::ITALIC);
        }
        if style.underline {
            out = out.add_modifier(Modifier::UNDERLINED);
        }
        if style.strikethrough {
            out = out.add_modifier(Modifier::CROSSED_OUT);
        }
        if style.code {
            out = out.fg(self.code_text);
        }
        out
    }

    /// Get HP bar color based on ratio
    pub fn hp_color(&self, ratio: f64) -> Color {
        if ratio > 0.5 {
            self.hp_healthy
        } else if ratio > 0.25 {
            self.hp_wounded
        } else {
            self.hp_critical
        }
    }

    pub fn connection_style(&self, status: ConnectionStatus) -> Style {
        let color = match status {
            ConnectionStatus::Online {
                ai_available: true, ..
            } => self.online,
            ConnectionStatus::Online { .. } | ConnectionStatus::Unknown => self.degraded,
            ConnectionStatus::Unreachable => self.offline,
        };
        Style::default().fg(color)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Highlight for the selected menu row
    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}
