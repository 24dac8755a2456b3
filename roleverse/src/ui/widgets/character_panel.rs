//! Character panel widget for sidebar display

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use roleverse_core::universe::DEFAULT_HEALTH;
use roleverse_core::CharacterSheet;

use crate::ui::theme::GameTheme;

/// Compact character sheet for the sidebar
pub struct CharacterPanelWidget<'a> {
    sheet: &'a CharacterSheet,
    universe: Option<&'a str>,
    theme: &'a GameTheme,
    focused: bool,
}

impl<'a> CharacterPanelWidget<'a> {
    pub fn new(sheet: &'a CharacterSheet, theme: &'a GameTheme) -> Self {
        Self {
            sheet,
            universe: None,
            theme,
            focused: false,
        }
    }

    pub fn universe(mut self, universe: Option<&'a str>) -> Self {
        self.universe = universe;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for CharacterPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Character ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let stat_rows = self.sheet.stats.len().max(1) as u16 + 1;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),         // Name/universe
                Constraint::Length(2),         // HP bar
                Constraint::Length(stat_rows), // Stats
                Constraint::Min(0),            // Inventory/abilities
            ])
            .split(inner);

        // Name and universe
        let name = self.sheet.character.as_deref().unwrap_or("No character yet");
        let header = vec![
            Line::from(Span::styled(
                first_line(name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.universe.unwrap_or("No universe chosen").to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        Paragraph::new(header).render(chunks[0], buf);

        // HP bar
        let health = self.sheet.health;
        let hp_ratio = health_ratio(health);
        let gauge = Gauge::default()
            .block(Block::default())
            .gauge_style(Style::default().fg(self.theme.hp_color(hp_ratio)))
            .ratio(hp_ratio)
            .label(format!("HP: {health}/{DEFAULT_HEALTH}"));
        gauge.render(chunks[1], buf);

        // Stats
        let mut stat_lines = vec![Line::from(Span::styled(
            "Stats",
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))];
        if self.sheet.stats.is_empty() {
            stat_lines.push(Line::from(Span::styled(
                "  none yet",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        for (name, value) in &self.sheet.stats {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            stat_lines.push(Line::from(format!("  {name}: {value}")));
        }
        Paragraph::new(stat_lines).render(chunks[2], buf);

        // Inventory and abilities
        if chunks[3].height > 0 {
            let mut lines = Vec::new();
            push_list(&mut lines, "Inventory", &self.sheet.inventory);
            if !self.sheet.abilities.is_empty() {
                lines.push(Line::from(""));
                push_list(&mut lines, "Abilities", &self.sheet.abilities);
            }
            if let Some(context) = &self.sheet.world_context {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    context.clone(),
                    Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
                )));
            }
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .render(chunks[3], buf);
        }
    }
}

fn push_list(lines: &mut Vec<Line<'static>>, title: &'static str, items: &[String]) {
    lines.push(Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::UNDERLINED),
    )));
    if items.is_empty() {
        lines.push(Line::from(Span::styled(
            "  empty",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    for item in items {
        lines.push(Line::from(format!("  • {item}")));
    }
}

/// Health as a gauge ratio. Servers may report more than the starting value.
fn health_ratio(health: i32) -> f64 {
    (f64::from(health) / f64::from(DEFAULT_HEALTH)).clamp(0.0, 1.0)
}

/// Character descriptions can be long; the header only has room for one line.
fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_ratio_is_clamped() {
        assert_eq!(health_ratio(50), 0.5);
        assert_eq!(health_ratio(-10), 0.0);
        assert_eq!(health_ratio(250), 1.0);
    }
}
