//! Main application state and logic

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use game_api::Error as ApiError;
use roleverse_core::{
    CallResult, Phase, Reply, Request, SessionMachine, Typewriter, Universe,
};
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::ui::theme::GameTheme;
use crate::ui::Overlay;

/// How long a highlighted preset stays on screen before it is sent.
pub const UNIVERSE_CONFIRM_DELAY: Duration = Duration::from_millis(600);

const HISTORY_LIMIT: usize = 100;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - free text input
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// Main application state
pub struct App {
    pub machine: SessionMachine,
    request_tx: mpsc::UnboundedSender<Request>,

    // UI state
    pub theme: GameTheme,
    overlay: Option<Overlay>,

    // Narrative display
    pub narrative_scroll: usize,
    pub scroll_locked_to_bottom: bool, // True = auto-scroll on new content

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>, // Saved current input when browsing history

    // Universe menu
    pub universe_index: usize,
    pub custom_rules_editing: bool,
    auto_advance: Option<(Universe, Instant)>,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,

    // Timing
    health_interval: Duration,
    next_health: Instant,
    last_tick: Instant,
}

impl App {
    /// Create the application around the worker's request channel.
    pub fn new(config: &ClientConfig, request_tx: mpsc::UnboundedSender<Request>) -> Self {
        let typewriter = Typewriter::new().with_default_options(config.animation_options());
        let now = Instant::now();

        Self {
            machine: SessionMachine::with_typewriter(typewriter),
            request_tx,
            theme: GameTheme::default(),
            overlay: None,
            narrative_scroll: 0,
            scroll_locked_to_bottom: true,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(HISTORY_LIMIT),
            history_index: None,
            saved_input: None,
            universe_index: 0,
            custom_rules_editing: false,
            auto_advance: None,
            status_message: None,
            should_quit: false,
            health_interval: config.health_interval,
            next_health: now,
            last_tick: now,
        }
    }

    /// Kick off the first session.
    pub fn start(&mut self) {
        let request = self.machine.start();
        self.dispatch(request);
    }

    // =========================================================================
    // Worker plumbing
    // =========================================================================

    /// Hand a request to the worker. A dead worker is answered locally with a
    /// network failure so the machine never waits on a reply that cannot come.
    pub fn dispatch(&mut self, request: Option<Request>) {
        let mut next = request;
        while let Some(request) = next.take() {
            if let Err(mpsc::error::SendError(request)) = self.request_tx.send(request) {
                tracing::warn!(endpoint = %request.call.endpoint(), "worker unavailable");
                let reply = Reply::failed(request, ApiError::Network("worker stopped".into()));
                next = self.machine.apply(reply);
            }
        }
    }

    /// Feed a worker reply into the session.
    pub fn handle_reply(&mut self, reply: Reply) {
        let opens_save = reply.generation == self.machine.generation()
            && matches!(reply.result, CallResult::SaveGame(Ok(_)));

        let follow_up = self.machine.apply(reply);
        self.dispatch(follow_up);

        if opens_save {
            if let Some(text) = self.machine.last_save_text() {
                self.overlay = Some(Overlay::Save(text.to_string()));
                self.set_status("Save data ready. Copy it somewhere safe.");
            }
        }
        if self.machine.phase() != Phase::SelectingUniverse {
            self.custom_rules_editing = false;
        }
        if self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
    }

    /// Per-frame housekeeping: reveal steps, the universe confirm delay and
    /// health polling.
    pub fn tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        let typewriter = self.machine.typewriter_mut();
        typewriter.advance(elapsed);
        if !typewriter.drain_events().is_empty() && self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }

        if let Some((universe, due)) = self.auto_advance {
            if now >= due {
                self.auto_advance = None;
                let request = self.machine.choose_universe(universe.into());
                self.dispatch(request);
            }
        }

        if now >= self.next_health {
            self.next_health = now + self.health_interval;
            let request = self.machine.poll_health();
            self.dispatch(Some(request));
        }
    }

    /// How long the event loop may sleep before the next reveal step.
    pub fn time_until_next_step(&self) -> Option<Duration> {
        self.machine.typewriter().time_until_next_step()
    }

    /// Finish the current animation.
    pub fn skip_animation(&mut self) -> bool {
        self.machine.typewriter_mut().skip_active()
    }

    // =========================================================================
    // Universe menu
    // =========================================================================

    pub fn universe_menu_active(&self) -> bool {
        self.machine.phase() == Phase::SelectingUniverse && !self.custom_rules_editing
    }

    pub fn highlighted_universe(&self) -> Universe {
        Universe::ALL[self.universe_index.min(Universe::ALL.len() - 1)]
    }

    /// Ruleset of the highlighted entry. Custom falls back to its description.
    pub fn highlighted_ruleset(&self) -> &'static str {
        let universe = self.highlighted_universe();
        universe.ruleset().unwrap_or(universe.description())
    }

    /// The preset waiting out its confirm delay.
    pub fn pending_universe(&self) -> Option<Universe> {
        self.auto_advance.map(|(universe, _)| universe)
    }

    pub fn universe_next(&mut self) {
        self.universe_index = (self.universe_index + 1) % Universe::ALL.len();
    }

    pub fn universe_prev(&mut self) {
        self.universe_index = (self.universe_index + Universe::ALL.len() - 1) % Universe::ALL.len();
    }

    /// Pick the highlighted universe. Presets are sent after a short delay so
    /// the choice stays visible, and picking another one in the meantime
    /// replaces it. Confirming the pending preset again sends it at once.
    /// Custom opens the rules editor.
    pub fn confirm_universe(&mut self, now: Instant) {
        if self.machine.is_busy() {
            return;
        }
        let universe = self.highlighted_universe();
        if universe.is_custom() {
            self.auto_advance = None;
            self.custom_rules_editing = true;
            self.input_mode = InputMode::Insert;
            self.clear_input();
            self.set_status("Describe the rules of your universe, then press Enter");
        } else if self.pending_universe() == Some(universe) {
            self.auto_advance = None;
            let request = self.machine.choose_universe(universe.into());
            self.dispatch(request);
        } else {
            self.auto_advance = Some((universe, now + UNIVERSE_CONFIRM_DELAY));
            self.set_status(format!("{universe} selected"));
        }
    }

    /// Pick a universe by its 1-based menu number.
    pub fn select_universe_number(&mut self, number: usize, now: Instant) {
        if (1..=Universe::ALL.len()).contains(&number) {
            self.universe_index = number - 1;
            self.confirm_universe(now);
        }
    }

    // =========================================================================
    // Input handling
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        // Clear command buffer when leaving command mode
        if self.input_buffer.starts_with(':') {
            self.input_buffer.clear();
            self.cursor_position = 0;
        }
    }

    /// Leave the custom rules editor and return to the menu.
    pub fn cancel_custom_rules(&mut self) {
        if self.custom_rules_editing {
            self.custom_rules_editing = false;
            self.clear_input();
            self.clear_status();
        }
    }

    /// Take the input buffer, recording it in history.
    pub fn take_input(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        // Add to history (if not a command)
        if !input.starts_with(':') {
            self.input_history.push_front(input.clone());
            if self.input_history.len() > HISTORY_LIMIT {
                self.input_history.pop_back();
            }
        }
        self.history_index = None;
        self.saved_input = None;

        Some(input)
    }

    /// Send typed text to whatever the current phase expects.
    /// Submit what is in the input line. While a request is in flight the
    /// line is kept so nothing the player typed is lost.
    pub fn submit_line(&mut self) {
        if self.machine.is_busy() {
            self.set_status("Waiting for the server...");
            return;
        }
        if let Some(input) = self.take_input() {
            self.submit_input(&input);
        }
    }

    pub fn submit_input(&mut self, text: &str) {
        if self.machine.is_busy() {
            self.set_status("Waiting for the server...");
            return;
        }
        let request = match self.machine.phase() {
            Phase::Uninitialized => self.machine.start(),
            Phase::SelectingUniverse => {
                if self.custom_rules_editing {
                    self.machine.choose_custom_universe(text)
                } else {
                    match Universe::from_id(text) {
                        Some(universe) if !universe.is_custom() => {
                            self.machine.choose_universe(universe.into())
                        }
                        _ => {
                            self.set_status("Pick a universe from the list");
                            None
                        }
                    }
                }
            }
            Phase::CreatingCharacter => self.machine.create_character(text),
            Phase::Playing | Phase::Ended => self.machine.perform_action(text),
        };
        self.dispatch(request);
        self.scroll_to_bottom();
    }

    /// Run a `:` command.
    pub fn process_command(&mut self, input: &str) {
        let command = input.trim().trim_start_matches(':');
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((command, ""));

        match name {
            "q" | "quit" => self.should_quit = true,
            "w" | "save" => {
                let request = self.machine.save();
                if request.is_some() {
                    self.set_status("Saving...");
                }
                self.dispatch(request);
            }
            "load" => {
                let request = self.machine.load(arg);
                if request.is_some() {
                    self.set_status("Loading...");
                }
                self.dispatch(request);
            }
            "new" => {
                self.auto_advance = None;
                self.custom_rules_editing = false;
                self.universe_index = 0;
                let request = self.machine.new_game();
                self.dispatch(request);
                self.set_status("New game");
            }
            "status" => {
                let request = self.machine.refresh_status();
                self.dispatch(request);
            }
            "health" => {
                let request = self.machine.poll_health();
                self.dispatch(Some(request));
            }
            "skip" => {
                self.skip_animation();
            }
            "help" | "h" => self.toggle_help(),
            "" => {}
            other => self.set_status(format!("Unknown command: {other}")),
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Scroll narrative to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // Set to max value - the widget will cap it to actual max_scroll
        self.narrative_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Estimate max scroll based on transcript content
    /// Uses conservative estimate assuming ~60 char effective width
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .machine
            .typewriter()
            .transcript()
            .entries()
            .iter()
            .map(|entry| {
                entry
                    .visible_text()
                    .lines()
                    .map(|line| (line.chars().count() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1 // blank line between entries
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll narrative up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.narrative_scroll > max_scroll {
            self.narrative_scroll = max_scroll;
        }
        self.narrative_scroll = self.narrative_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll narrative down
    pub fn scroll_down(&mut self, lines: usize) {
        self.narrative_scroll = self.narrative_scroll.saturating_add(lines);
        let max_scroll = self.estimate_max_scroll();
        self.narrative_scroll = self.narrative_scroll.min(max_scroll + 100);
    }

    // =========================================================================
    // Line editing
    // =========================================================================

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor_position);
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.remove_char_at(self.cursor_position);
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if self.cursor_position < self.input_buffer.chars().count() {
            self.remove_char_at(self.cursor_position);
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }

    fn remove_char_at(&mut self, char_index: usize) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(char_index) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let index = match self.history_index {
            None => 0,
            Some(i) if i + 1 < self.input_history.len() => i + 1,
            Some(i) => i, // Already at oldest
        };

        if let Some(entry) = self.input_history.get(index).cloned() {
            self.set_input(entry);
            self.history_index = Some(index);
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                let saved = self.saved_input.take().unwrap_or_default();
                self.set_input(saved);
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1).cloned() {
                    self.set_input(entry);
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    // =========================================================================
    // Overlays and status
    // =========================================================================

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Set input buffer content and move cursor to end (unicode-safe)
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }
}
