//! Render orchestration for the RoleVerse TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use roleverse_core::{Phase, Universe};

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{
    CharacterPanelWidget, HotkeyBarWidget, InputWidget, NarrativeWidget, StatusBarWidget,
};

/// Overlay types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
    /// Save data to copy out.
    Save(String),
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    if app.universe_menu_active() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(Universe::ALL.len() as u16 * 2 + 2 + RULESET_ROWS),
            ])
            .split(layout.narrative_area);
        render_narrative(frame, app, rows[0]);
        render_universe_menu(frame, app, rows[1]);
    } else {
        render_narrative(frame, app, layout.narrative_area);
    }

    let universe_name = app
        .machine
        .state()
        .selected_universe
        .as_ref()
        .map(|id| universe_label(id.as_str()));
    let character_widget = CharacterPanelWidget::new(app.machine.sheet(), &app.theme)
        .universe(universe_name.as_deref());
    frame.render_widget(character_widget, layout.sidebar_area);

    let status_widget = StatusBarWidget::new(app.machine.phase(), app.input_mode, &app.theme)
        .connection(app.machine.connection())
        .busy(app.machine.is_busy())
        .offline(app.machine.state().offline)
        .message(app.status_message());
    frame.render_widget(status_widget, layout.status_bar);

    let hotkey_widget = HotkeyBarWidget::new(app.machine.phase(), app.input_mode)
        .menu_active(app.universe_menu_active());
    frame.render_widget(hotkey_widget, layout.hotkey_bar);

    render_input(frame, app, layout.input_area);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.machine.state().selected_universe.as_ref() {
        Some(id) => format!(" RoleVerse | {} ", universe_label(id.as_str())),
        None => " RoleVerse ".to_string(),
    };

    let line = Line::from(Span::styled(
        title,
        Style::default()
            .fg(app.theme.foreground)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn universe_label(id: &str) -> String {
    Universe::from_id(id)
        .map(|u| u.name().to_string())
        .unwrap_or_else(|| id.to_string())
}

fn render_narrative(frame: &mut Frame, app: &App, area: Rect) {
    let typewriter = app.machine.typewriter();
    let narrative_widget =
        NarrativeWidget::new(typewriter.transcript().entries(), &app.theme)
            .scroll(app.narrative_scroll)
            .focused(app.input_mode == InputMode::Normal && !app.universe_menu_active())
            .animating(typewriter.is_animating());
    frame.render_widget(narrative_widget, area);
}

/// Rows under the menu entries for the highlighted ruleset.
const RULESET_ROWS: u16 = 4;

/// Render the universe picker
fn render_universe_menu(frame: &mut Frame, app: &App, area: Rect) {
    let pending = app.pending_universe();
    let mut lines = Vec::new();

    for (i, universe) in Universe::ALL.iter().enumerate() {
        let selected = i == app.universe_index;
        let marker = match (selected, pending == Some(*universe)) {
            (_, true) => "✓",
            (true, false) => "▶",
            _ => " ",
        };
        // Prefer the server's wording when it sent any.
        let description = app
            .machine
            .server_universes()
            .iter()
            .find(|summary| summary.id == universe.id() && !summary.description.is_empty())
            .map(|summary| summary.description.as_str())
            .unwrap_or(universe.description());

        let name_style = if selected {
            app.theme.selected_style()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} {}. ", i + 1), name_style),
            Span::styled(universe.name(), name_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("     {description}"),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        app.highlighted_ruleset(),
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    let block = Block::default()
        .title(" Choose a universe ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Render the input area
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = matches!(app.input_mode, InputMode::Command);

    let title = match app.machine.phase() {
        Phase::Uninitialized => "Connecting",
        Phase::SelectingUniverse if app.custom_rules_editing => "Rules of your universe",
        Phase::SelectingUniverse => "Universe",
        Phase::CreatingCharacter => "Describe your character",
        Phase::Playing => "What do you do?",
        Phase::Ended => "The End",
    };

    let placeholder = if app.machine.is_busy() {
        "Waiting for the story..."
    } else if is_active {
        ""
    } else {
        "Press i to type"
    };

    let input_widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .title(title)
        .active(is_active)
        .command_mode(is_command)
        .placeholder(placeholder);

    frame.render_widget(input_widget, area);
}

/// Render overlay
fn render_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
        Overlay::Save(text) => render_save_overlay(frame, app, text, area),
    }
}

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::UNDERLINED),
    ))
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(56, 26, area);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            " RoleVerse - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Input Modes:"),
        Line::from("  i       Enter INSERT mode (type)"),
        Line::from("  :       Enter COMMAND mode"),
        Line::from("  Esc     Return to NORMAL mode"),
        Line::from(""),
        heading("NORMAL mode:"),
        Line::from("  Space/Esc      Finish the text being typed"),
        Line::from("  j/k or ↑/↓     Scroll up/down"),
        Line::from("  PgUp/PgDn      Scroll by page"),
        Line::from("  g/G            Jump to top/bottom"),
        Line::from("  1-4, Enter     Pick a universe"),
        Line::from("  q              Quit"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :w, :save      Save game"),
        Line::from("  :load <data>   Load saved data"),
        Line::from("  :new           Start a new game"),
        Line::from("  :status        Refresh the character sheet"),
        Line::from("  :q             Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Render the save data popup
fn render_save_overlay(frame: &mut Frame, app: &App, text: &str, area: Rect) {
    let popup_area = centered_rect_fixed(
        area.width.saturating_sub(8).max(20),
        area.height.saturating_sub(6).max(8),
        area,
    );

    frame.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Copy this text to keep your progress. Restore it with :load <text>.",
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
    ];
    lines.extend(text.lines().map(|line| Line::from(line.to_string())));

    let block = Block::default()
        .title(" Save data (Esc to close) ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
