//! Headless mode for RoleVerse.
//!
//! A line-oriented interface without a TUI, for scripting and automated
//! testing. Lines starting with `#` are commands; anything else is routed to
//! whatever the session is waiting for (universe, character, or action).
//! Story text is printed in full as soon as it arrives.

use std::io::{self, BufRead, Write};

use roleverse_core::{
    parse_markup, GameBackend, MessageId, MessageKind, Phase, Session, Universe, UniverseId,
};

/// What the input loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// A session plus the bookkeeping needed to print only new transcript entries.
pub struct HeadlessClient<B: GameBackend> {
    session: Session<B>,
    last_printed: Option<MessageId>,
}

impl<B: GameBackend> HeadlessClient<B> {
    pub fn new(session: Session<B>) -> Self {
        Self {
            session,
            last_printed: None,
        }
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    /// Start the session and print the greeting.
    pub async fn start(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.session.start().await;
        self.flush_transcript(out)
    }

    /// Handle one input line.
    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Step> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Step::Continue);
        }

        if let Some(command) = line.strip_prefix('#') {
            let (name, arg) = command
                .split_once(char::is_whitespace)
                .map(|(name, arg)| (name, arg.trim()))
                .unwrap_or((command, ""));

            match name {
                "quit" | "exit" => {
                    writeln!(out, "Goodbye!")?;
                    return Ok(Step::Quit);
                }
                "start" => self.session.start().await,
                "universe" => self.session.choose_universe(UniverseId::new(arg)).await,
                "rules" => self.session.choose_custom_universe(arg).await,
                "character" => self.session.create_character(arg).await,
                "save" => {
                    self.session.save().await;
                    self.flush_transcript(out)?;
                    if let Some(text) = self.session.machine().last_save_text() {
                        writeln!(out, "[SAVED]")?;
                        writeln!(out, "{text}")?;
                    }
                    return Ok(Step::Continue);
                }
                "load" => self.session.load(arg).await,
                "status" => {
                    self.session.refresh_status().await;
                    self.session.poll_health().await;
                    self.flush_transcript(out)?;
                    self.print_status(out)?;
                    return Ok(Step::Continue);
                }
                "new" => {
                    self.last_printed = None;
                    self.session.new_game().await;
                }
                "help" => {
                    print_commands(out)?;
                    return Ok(Step::Continue);
                }
                _ => {
                    writeln!(out, "[ERROR] Unknown command. Type #help for help.")?;
                    return Ok(Step::Continue);
                }
            }
            self.flush_transcript(out)?;
            return Ok(Step::Continue);
        }

        match self.session.machine().phase() {
            Phase::Uninitialized => self.session.start().await,
            Phase::SelectingUniverse => match Universe::from_id(line) {
                Some(universe) if !universe.is_custom() => {
                    self.session.choose_universe(universe).await
                }
                _ => self.session.choose_custom_universe(line).await,
            },
            Phase::CreatingCharacter => self.session.create_character(line).await,
            Phase::Playing | Phase::Ended => self.session.perform_action(line).await,
        }
        self.flush_transcript(out)?;
        Ok(Step::Continue)
    }

    /// Print every entry added since the last flush, fully revealed.
    fn flush_transcript(&mut self, out: &mut impl Write) -> io::Result<()> {
        let typewriter = self.session.machine_mut().typewriter_mut();
        typewriter.skip_active();
        typewriter.drain_events();

        let last = self.last_printed;
        for entry in typewriter
            .transcript()
            .entries()
            .iter()
            .filter(|entry| last.map_or(true, |last| entry.id() > last))
        {
            let text: Vec<String> = parse_markup(&entry.markup())
                .iter()
                .map(|line| line.plain_text())
                .collect();
            let text = text.join("\n");
            match entry.message().kind {
                MessageKind::Narration => {
                    writeln!(out, "[STORY]")?;
                    writeln!(out, "{text}")?;
                    writeln!(out)?;
                }
                MessageKind::System => writeln!(out, "[SYSTEM] {text}")?,
                MessageKind::Error => writeln!(out, "[ERROR] {text}")?,
                MessageKind::PlayerInput => {}
            }
            self.last_printed = Some(entry.id());
        }
        out.flush()
    }

    fn print_status(&self, out: &mut impl Write) -> io::Result<()> {
        let machine = self.session.machine();
        let sheet = machine.sheet();
        writeln!(out, "[STATUS]")?;
        writeln!(out, "  Phase: {}", machine.phase())?;
        if let Some(universe) = &machine.state().selected_universe {
            writeln!(out, "  Universe: {universe}")?;
        }
        if let Some(character) = &sheet.character {
            writeln!(out, "  Character: {character}")?;
        }
        writeln!(out, "  Health: {}", sheet.health)?;
        if !sheet.inventory.is_empty() {
            writeln!(out, "  Inventory: {}", sheet.inventory.join(", "))?;
        }
        for (name, value) in &sheet.stats {
            writeln!(out, "  {name}: {value}")?;
        }
        if machine.state().offline {
            writeln!(out, "  Server: offline play")?;
        } else {
            writeln!(out, "  Server: {}", machine.connection())?;
        }
        Ok(())
    }
}

fn print_commands(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "[HELP]")?;
    writeln!(out, "  #universe <id>      - Pick fantasy, cyberpunk or space_opera")?;
    writeln!(out, "  #rules <text>       - Play a custom universe with these rules")?;
    writeln!(out, "  #character <text>   - Describe your character")?;
    writeln!(out, "  #save               - Print save data")?;
    writeln!(out, "  #load <json>        - Restore from save data")?;
    writeln!(out, "  #status             - Show the character sheet")?;
    writeln!(out, "  #new                - Start over")?;
    writeln!(out, "  #quit               - Exit")?;
    writeln!(out, "  (anything else goes to whatever the story is waiting for)")
}

/// Run headless against stdin and stdout.
pub async fn run_headless<B: GameBackend>(session: Session<B>) -> io::Result<()> {
    let mut client = HeadlessClient::new(session);
    let mut stdout = io::stdout();

    writeln!(stdout, "=== RoleVerse Headless Mode ===")?;
    print_commands(&mut stdout)?;
    writeln!(stdout)?;
    client.start(&mut stdout).await?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                break;
            }
        };
        if client.handle_line(&line, &mut stdout).await? == Step::Quit {
            break;
        }
    }

    Ok(())
}
