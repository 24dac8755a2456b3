//! The session state machine.
//!
//! Every user intent goes through a method that validates it against the
//! current phase and either answers locally (validation errors, offline play)
//! or returns a [`Request`] for the caller to run. Feeding the result back
//! through [`SessionMachine::apply`] performs the transition and routes text
//! to the typewriter.

use uuid::Uuid;

use game_api::{
    ActionRequest, ActionResponse, ChooseUniverseRequest, ChooseUniverseResponse,
    CreateCharacterRequest, CreateCharacterResponse, Error, HealthResponse, LoadGameRequest,
    LoadGameResponse, SaveGameResponse, SessionRequest, StartGameResponse, StatusResponse,
    UniverseSummary,
};

use super::state::{CharacterSheet, ConnectionStatus, Phase, SessionState};
use super::SessionError;
use crate::backend::{Call, CallResult, Reply, Request};
use crate::message::Message;
use crate::scheduler::{Scheduler, TimerQueue};
use crate::typewriter::Typewriter;
use crate::universe::{default_stats, fallback_for, Universe, UniverseId, DEFAULT_HEALTH};

/// Prefix of session ids minted without the server.
pub const LOCAL_SESSION_PREFIX: &str = "local-";

/// Session-mutating call waiting for its reply, with what the reply needs.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Start,
    Universe(UniverseId),
    Character(String),
    Action,
    Load,
}

/// Drives one player's session and owns everything it shows.
pub struct SessionMachine<S: Scheduler = TimerQueue> {
    state: SessionState,
    sheet: CharacterSheet,
    connection: ConnectionStatus,
    typewriter: Typewriter<S>,
    universes: Vec<UniverseSummary>,
    generation: u64,
    pending: Option<Pending>,
    offline_turns: usize,
    last_save_text: Option<String>,
}

impl SessionMachine<TimerQueue> {
    pub fn new() -> Self {
        Self::with_typewriter(Typewriter::new())
    }
}

impl Default for SessionMachine<TimerQueue> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> SessionMachine<S> {
    pub fn with_typewriter(typewriter: Typewriter<S>) -> Self {
        Self {
            state: SessionState::default(),
            sheet: CharacterSheet::default(),
            connection: ConnectionStatus::default(),
            typewriter,
            universes: Vec::new(),
            generation: 0,
            pending: None,
            offline_turns: 0,
            last_save_text: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn sheet(&self) -> &CharacterSheet {
        &self.sheet
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn typewriter(&self) -> &Typewriter<S> {
        &self.typewriter
    }

    pub fn typewriter_mut(&mut self) -> &mut Typewriter<S> {
        &mut self.typewriter
    }

    /// Universes the server advertised on start, if any.
    pub fn server_universes(&self) -> &[UniverseSummary] {
        &self.universes
    }

    /// Pretty-printed blob from the last successful save.
    pub fn last_save_text(&self) -> Option<&str> {
        self.last_save_text.as_deref()
    }

    /// A session-mutating call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========================================================================
    // User intents
    // ========================================================================

    /// Obtain a session id. Only valid before one exists.
    pub fn start(&mut self) -> Option<Request> {
        if self.state.phase != Phase::Uninitialized {
            tracing::debug!(phase = ?self.state.phase, "start ignored, session already running");
            return None;
        }
        self.begin(Pending::Start, Call::StartGame).ok()
    }

    /// Pick a preset universe.
    pub fn choose_universe(&mut self, universe: UniverseId) -> Option<Request> {
        if universe.is_custom() {
            self.error("A custom universe needs rules. Describe them to continue.");
            return None;
        }
        self.select_universe(universe, None)
    }

    /// Pick a custom universe with the player's own rules.
    pub fn choose_custom_universe(&mut self, rules: &str) -> Option<Request> {
        let rules = rules.trim();
        if rules.is_empty() {
            self.error("Please describe the rules of your universe.");
            return None;
        }
        self.select_universe(Universe::Custom.into(), Some(rules.to_string()))
    }

    /// Describe the player character.
    pub fn create_character(&mut self, prompt: &str) -> Option<Request> {
        if self.state.phase != Phase::CreatingCharacter {
            self.error(format!("You cannot create a character now ({}).", self.state.phase));
            return None;
        }
        if self.state.selected_universe.is_none() {
            self.error("Choose a universe before creating a character.");
            return None;
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.error("Please describe your character.");
            return None;
        }
        let user_id = self.session_id()?;
        if self.is_busy() {
            tracing::debug!("character creation refused, request in flight");
            return None;
        }

        self.typewriter.append(Message::player(prompt));
        if self.state.offline {
            self.fallback_character(prompt.to_string(), "Playing offline with a default character.");
            return None;
        }

        let call = Call::CreateCharacter(CreateCharacterRequest {
            user_id,
            character_prompt: prompt.to_string(),
        });
        self.begin(Pending::Character(prompt.to_string()), call).ok()
    }

    /// Submit a free-text action.
    pub fn perform_action(&mut self, text: &str) -> Option<Request> {
        if self.state.phase != Phase::Playing {
            let reason = match self.state.phase {
                Phase::Ended => "The story has ended. Start a new game to play again.",
                _ => "The game has not started yet.",
            };
            self.error(reason);
            return None;
        }
        let action = text.trim();
        if action.is_empty() {
            self.error("Please describe your action.");
            return None;
        }
        let user_id = self.session_id()?;

        if self.is_busy() {
            tracing::debug!("action refused, request in flight");
            return None;
        }

        self.typewriter.append(Message::player(action));
        if self.state.offline {
            self.offline_action();
            return None;
        }

        let call = Call::Action(ActionRequest {
            user_id,
            action: action.to_string(),
        });
        self.begin(Pending::Action, call).ok()
    }

    /// Ask the server for a save blob.
    pub fn save(&mut self) -> Option<Request> {
        let user_id = self.session_id()?;
        if self.state.offline {
            self.error("Saving needs a connection to the game server.");
            return None;
        }
        Some(self.request(Call::SaveGame(SessionRequest::new(user_id))))
    }

    /// Restore from save text the player pasted in.
    pub fn load(&mut self, save_text: &str) -> Option<Request> {
        let save_data = match parse_save_text(save_text) {
            Ok(data) => data,
            Err(e) => {
                self.error(e.to_string());
                return None;
            }
        };
        let user_id = self.session_id()?;
        if self.state.offline {
            self.error("Loading needs a connection to the game server.");
            return None;
        }
        let call = Call::LoadGame(LoadGameRequest { user_id, save_data });
        self.begin(Pending::Load, call).ok()
    }

    /// Refresh the character sheet. Best-effort.
    pub fn refresh_status(&mut self) -> Option<Request> {
        let user_id = self.state.session_id.clone()?;
        if self.state.offline {
            return None;
        }
        Some(self.request(Call::GetStatus(SessionRequest::new(user_id))))
    }

    /// Check server health. Best-effort and valid in any phase.
    pub fn poll_health(&mut self) -> Request {
        self.request(Call::Health)
    }

    /// Throw the current session away and start over.
    ///
    /// Replies to anything issued before this call are ignored.
    pub fn new_game(&mut self) -> Option<Request> {
        self.generation += 1;
        self.pending = None;
        self.state = SessionState::default();
        self.sheet = CharacterSheet::default();
        self.universes.clear();
        self.offline_turns = 0;
        self.last_save_text = None;
        self.typewriter.clear();
        tracing::info!(generation = self.generation, "new game");
        self.start()
    }

    // ========================================================================
    // Replies
    // ========================================================================

    /// Apply the result of a request. May return a follow-up request.
    pub fn apply(&mut self, reply: Reply) -> Option<Request> {
        let endpoint = reply.result.endpoint();
        let health = matches!(reply.result, CallResult::Health(_));
        if reply.generation != self.generation && !health {
            tracing::debug!(
                %endpoint,
                reply_generation = reply.generation,
                generation = self.generation,
                "dropping reply from an earlier session"
            );
            return None;
        }

        let pending = if endpoint.is_session_mutating() {
            self.pending.take()
        } else {
            None
        };

        match (reply.result, pending) {
            (CallResult::StartGame(result), Some(Pending::Start)) => {
                self.on_start(result);
                None
            }
            (CallResult::ChooseUniverse(result), Some(Pending::Universe(universe))) => {
                self.on_universe(universe, result);
                None
            }
            (CallResult::CreateCharacter(result), Some(Pending::Character(prompt))) => {
                self.on_character(prompt, result);
                None
            }
            (CallResult::Action(result), Some(Pending::Action)) => self.on_action(result),
            (CallResult::LoadGame(result), Some(Pending::Load)) => {
                self.on_load(result);
                None
            }
            (CallResult::GetStatus(result), _) => {
                self.on_status(result);
                None
            }
            (CallResult::SaveGame(result), _) => {
                self.on_save(result);
                None
            }
            (CallResult::Health(result), _) => {
                self.on_health(result);
                None
            }
            (_, pending) => {
                tracing::warn!(%endpoint, ?pending, "reply does not match the outstanding request");
                None
            }
        }
    }

    fn on_start(&mut self, result: Result<StartGameResponse, Error>) {
        let server_id = match result {
            Ok(response) => {
                self.universes = response.universes;
                response.user_id.filter(|id| !id.trim().is_empty())
            }
            Err(e) => {
                tracing::warn!(error = %e, "start-game failed, going offline");
                None
            }
        };

        match server_id {
            Some(id) => {
                tracing::info!(session_id = %id, "session started");
                self.state.session_id = Some(id);
                self.state.offline = false;
                self.system("Welcome to RoleVerse! Choose a universe to begin your story.");
            }
            None => {
                let id = format!("{LOCAL_SESSION_PREFIX}{}", Uuid::new_v4());
                tracing::info!(session_id = %id, "offline session started");
                self.state.session_id = Some(id);
                self.state.offline = true;
                self.system(
                    "The game server is unreachable, so this session runs offline with \
                     built-in stories. Choose a universe to begin.",
                );
            }
        }
        self.state.phase = Phase::SelectingUniverse;
    }

    fn on_universe(&mut self, universe: UniverseId, result: Result<ChooseUniverseResponse, Error>) {
        let name = universe_name(&universe);
        self.state.selected_universe = Some(universe);

        match result {
            Ok(ChooseUniverseResponse {
                success: true,
                need_character: Some(false),
                ..
            }) => {
                tracing::info!(universe = %name, "universe chosen, no character step");
                self.fallback_character(
                    format!("A traveler in the {name} universe"),
                    "The story begins right away with a default character.",
                );
            }
            Ok(ChooseUniverseResponse { success: true, .. }) => {
                tracing::info!(universe = %name, "universe chosen");
                self.state.phase = Phase::CreatingCharacter;
                self.system(format!("Universe: {name}. Now describe your character."));
            }
            Ok(ChooseUniverseResponse { message, .. }) => {
                tracing::warn!(universe = %name, ?message, "server declined universe choice");
                self.state.phase = Phase::CreatingCharacter;
                self.system(format!(
                    "The server could not set up {name}; continuing with built-in content. \
                     Describe your character."
                ));
            }
            Err(e) => {
                tracing::warn!(universe = %name, error = %e, "choose-universe failed");
                self.state.phase = Phase::CreatingCharacter;
                self.system(format!(
                    "Could not reach the server to set up {name}; continuing with built-in \
                     content. Describe your character."
                ));
            }
        }
    }

    fn on_character(&mut self, prompt: String, result: Result<CreateCharacterResponse, Error>) {
        let response = match result {
            Ok(response) if response.success => response,
            Ok(response) => {
                tracing::warn!(message = ?response.message, "server declined character creation");
                self.fallback_character(prompt, "The server could not create your character; starting with a default one.");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "create-character failed");
                self.fallback_character(prompt, "Could not reach the server; starting with a default character.");
                return;
            }
        };

        self.sheet = CharacterSheet {
            character: Some(prompt),
            inventory: response.inventory,
            stats: if response.stats.is_empty() {
                default_stats()
            } else {
                response.stats
            },
            abilities: response.abilities,
            health: response.health.unwrap_or(DEFAULT_HEALTH),
            world_context: None,
        };
        self.state.phase = Phase::Playing;
        tracing::info!("character created");

        if response.story.trim().is_empty() {
            tracing::warn!("server sent no opening story, using the built-in one");
            self.system("The server sent no opening, so the story starts with a built-in one.");
            let opening = fallback_for(self.state.selected_universe.as_ref()).opening;
            self.typewriter.append(Message::narration(opening));
        } else {
            self.typewriter.append(Message::narration(response.story));
        }
    }

    fn on_action(&mut self, result: Result<ActionResponse, Error>) -> Option<Request> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "action failed, using offline outcome");
                self.system("The server did not answer; here is an offline outcome.");
                self.offline_action();
                return None;
            }
        };

        if !response.success {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "The action could not be completed.".to_string());
            self.error(message);
            return None;
        }

        if let Some(chance) = response.chance {
            self.system(chance_message(chance));
        }
        if let Some(line) = roll_message(response.rolled, response.outcome.as_deref()) {
            self.system(line);
        }
        if let Some(story) = response.action_result.filter(|s| !s.trim().is_empty()) {
            self.typewriter.append(Message::narration(story));
        }
        let added = self.sheet.merge_items(&response.new_items);
        if !added.is_empty() {
            self.system(format!("New items: {}", added.join(", ")));
        }
        if response.game_over == Some(true) {
            tracing::info!("game over");
            self.state.phase = Phase::Ended;
            self.system("The story has ended. Start a new game to play again.");
        }

        self.refresh_status()
    }

    fn on_load(&mut self, result: Result<LoadGameResponse, Error>) {
        match result {
            Ok(LoadGameResponse {
                success: true,
                game_data: Some(data),
                ..
            }) => {
                self.sheet.restore(data);
                self.state.phase = Phase::Playing;
                tracing::info!("game loaded");
                self.system("Game loaded. Your story continues.");
            }
            Ok(LoadGameResponse { message, .. }) => {
                let reason = message.unwrap_or_else(|| "the save was rejected".to_string());
                self.error(format!("Could not load the game: {reason}."));
            }
            Err(e) => {
                tracing::warn!(error = %e, "load-game failed");
                self.error(format!("Could not load the game: {e}"));
            }
        }
    }

    fn on_status(&mut self, result: Result<StatusResponse, Error>) {
        match result {
            Ok(status) => self.sheet.update(status),
            Err(e) => tracing::warn!(error = %e, "status refresh failed"),
        }
    }

    fn on_save(&mut self, result: Result<SaveGameResponse, Error>) {
        match result {
            Ok(SaveGameResponse {
                success: true,
                save_data,
            }) => match serde_json::to_string_pretty(&save_data) {
                Ok(text) => {
                    self.last_save_text = Some(text);
                    tracing::info!("game saved");
                    self.system("Game saved. Copy the save text to restore this session later.");
                }
                Err(e) => self.error(format!("Could not save the game: {e}")),
            },
            Ok(_) => self.error("Could not save the game: the server refused."),
            Err(e) => {
                tracing::warn!(error = %e, "save-game failed");
                self.error(format!("Could not save the game: {e}"));
            }
        }
    }

    fn on_health(&mut self, result: Result<HealthResponse, Error>) {
        self.connection = match result {
            Ok(health) => ConnectionStatus::Online {
                active_sessions: health.active_sessions,
                ai_available: health.ai_available,
            },
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                ConnectionStatus::Unreachable
            }
        };
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn select_universe(&mut self, universe: UniverseId, custom_rules: Option<String>) -> Option<Request> {
        if self.state.phase != Phase::SelectingUniverse {
            self.error(format!("You cannot choose a universe now ({}).", self.state.phase));
            return None;
        }
        let user_id = self.session_id()?;

        if self.state.offline {
            let name = universe_name(&universe);
            self.state.selected_universe = Some(universe);
            self.state.phase = Phase::CreatingCharacter;
            self.system(format!("Universe: {name} (offline). Now describe your character."));
            return None;
        }

        let call = Call::ChooseUniverse(ChooseUniverseRequest {
            user_id,
            universe_id: universe.as_str().to_string(),
            custom_rules,
        });
        self.begin(Pending::Universe(universe), call).ok()
    }

    /// Enter play with canned content, telling the player so.
    fn fallback_character(&mut self, character: String, notice: &str) {
        let content = fallback_for(self.state.selected_universe.as_ref());
        self.sheet = CharacterSheet::from_fallback(Some(character), &content);
        self.state.phase = Phase::Playing;
        tracing::info!("playing with fallback character");
        self.system(notice);
        self.typewriter.append(Message::narration(content.opening));
    }

    fn offline_action(&mut self) {
        let content = fallback_for(self.state.selected_universe.as_ref());
        let narrative = content.action_narrative(self.offline_turns);
        self.offline_turns += 1;
        self.typewriter.append(Message::narration(narrative));
    }

    fn session_id(&mut self) -> Option<String> {
        match self.state.session_id.clone() {
            Some(id) => Some(id),
            None => {
                self.error(SessionError::NoSession.to_string());
                None
            }
        }
    }

    /// Claim the in-flight slot for a session-mutating call.
    fn begin(&mut self, pending: Pending, call: Call) -> Result<Request, SessionError> {
        if let Some(current) = &self.pending {
            tracing::debug!(?current, endpoint = %call.endpoint(), "refused, request in flight");
            return Err(SessionError::Busy);
        }
        self.pending = Some(pending);
        Ok(self.request(call))
    }

    fn request(&self, call: Call) -> Request {
        tracing::debug!(endpoint = %call.endpoint(), generation = self.generation, "issuing request");
        Request {
            generation: self.generation,
            call,
        }
    }

    fn system(&mut self, text: impl Into<String>) {
        self.typewriter.append(Message::system(text));
    }

    fn error(&mut self, text: impl Into<String>) {
        self.typewriter.append(Message::error(text));
    }
}

/// Parse pasted save text into the opaque blob the server expects.
pub fn parse_save_text(text: &str) -> Result<serde_json::Value, SessionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SessionError::EmptySave);
    }
    Ok(serde_json::from_str(text)?)
}

/// How the odds of an action are presented.
pub fn chance_message(chance: f64) -> String {
    let percent = chance.clamp(0.0, 100.0).round() as u32;
    let verdict = match percent {
        p if p >= 80 => "Almost certain!",
        p if p >= 60 => "Pretty good.",
        p if p >= 40 => "Fifty-fifty.",
        p if p >= 20 => "Risky...",
        _ => "Very doubtful.",
    };
    format!("{verdict} (Chance: {percent}%)")
}

fn roll_message(rolled: Option<f64>, outcome: Option<&str>) -> Option<String> {
    let outcome = outcome.map(str::trim).filter(|o| !o.is_empty());
    match (rolled, outcome) {
        (Some(roll), Some(outcome)) => Some(format!("Rolled {}: {outcome}", roll.round())),
        (Some(roll), None) => Some(format!("Rolled {}", roll.round())),
        (None, Some(outcome)) => Some(format!("Outcome: {outcome}")),
        (None, None) => None,
    }
}

fn universe_name(universe: &UniverseId) -> String {
    universe
        .preset()
        .map(|preset| preset.name().to_string())
        .unwrap_or_else(|| universe.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use game_api::Stats;

    fn machine() -> SessionMachine {
        SessionMachine::new()
    }

    fn reply(request: &Request, result: CallResult) -> Reply {
        Reply {
            generation: request.generation,
            result,
        }
    }

    fn last_kind(machine: &SessionMachine) -> MessageKind {
        machine.typewriter().transcript().last().unwrap().message().kind
    }

    fn last_text(machine: &SessionMachine) -> String {
        machine
            .typewriter()
            .transcript()
            .last()
            .unwrap()
            .message()
            .raw_text
            .clone()
    }

    /// A machine that reached `Playing` against a cooperative server.
    fn playing() -> SessionMachine {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        let choose = m.choose_universe(Universe::Fantasy.into()).unwrap();
        m.apply(reply(
            &choose,
            CallResult::ChooseUniverse(Ok(ChooseUniverseResponse {
                success: true,
                need_character: Some(true),
                message: None,
            })),
        ));
        let create = m.create_character("A wandering bard").unwrap();
        m.apply(reply(
            &create,
            CallResult::CreateCharacter(Ok(CreateCharacterResponse {
                success: true,
                game_started: true,
                story: "Your tale begins.".into(),
                inventory: vec!["Lute".into()],
                health: Some(90),
                ..CreateCharacterResponse::default()
            })),
        ));
        assert_eq!(m.phase(), Phase::Playing);
        m
    }

    #[test]
    fn test_start_goes_online() {
        let mut m = machine();
        let request = m.start().unwrap();
        assert_eq!(request.call, Call::StartGame);
        assert!(m.is_busy());

        m.apply(reply(
            &request,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        assert!(!m.is_busy());
        assert_eq!(m.phase(), Phase::SelectingUniverse);
        assert_eq!(m.state().session_id.as_deref(), Some("abc"));
        assert!(!m.state().offline);
    }

    #[test]
    fn test_start_failure_goes_offline() {
        let mut m = machine();
        let request = m.start().unwrap();
        m.apply(reply(
            &request,
            CallResult::StartGame(Err(Error::Network("refused".into()))),
        ));
        assert_eq!(m.phase(), Phase::SelectingUniverse);
        assert!(m.state().offline);
        assert!(m
            .state()
            .session_id
            .as_deref()
            .unwrap()
            .starts_with(LOCAL_SESSION_PREFIX));
        assert_eq!(last_kind(&m), MessageKind::System);
        assert!(last_text(&m).contains("offline"));
    }

    #[test]
    fn test_start_without_user_id_goes_offline() {
        let mut m = machine();
        let request = m.start().unwrap();
        m.apply(reply(&request, CallResult::StartGame(Ok(StartGameResponse::default()))));
        assert!(m.state().offline);
    }

    #[test]
    fn test_in_flight_guard() {
        let mut m = machine();
        let first = m.start().unwrap();
        m.apply(reply(
            &first,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        assert!(m.choose_universe(Universe::Cyberpunk.into()).is_some());
        assert!(m.is_busy());
        assert!(m.choose_universe(Universe::Fantasy.into()).is_none());
        assert!(m.load(r#"{"slot": 1}"#).is_none());
        // Best-effort calls are not guarded.
        assert!(m.save().is_some());
        assert!(m.refresh_status().is_some());
    }

    #[test]
    fn test_custom_universe_needs_rules() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        let before = m.typewriter().transcript().len();

        assert!(m.choose_custom_universe("   ").is_none());
        assert!(m.choose_universe(Universe::Custom.into()).is_none());
        assert_eq!(m.phase(), Phase::SelectingUniverse);
        assert_eq!(m.typewriter().transcript().len(), before + 2);
        assert_eq!(last_kind(&m), MessageKind::Error);

        let request = m.choose_custom_universe("Gravity is optional.").unwrap();
        match request.call {
            Call::ChooseUniverse(body) => {
                assert_eq!(body.universe_id, "custom");
                assert_eq!(body.custom_rules.as_deref(), Some("Gravity is optional."));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_universe_skip_character_step() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        let choose = m.choose_universe(Universe::SpaceOpera.into()).unwrap();
        m.apply(reply(
            &choose,
            CallResult::ChooseUniverse(Ok(ChooseUniverseResponse {
                success: true,
                need_character: Some(false),
                message: None,
            })),
        ));
        assert_eq!(m.phase(), Phase::Playing);
        assert_eq!(m.sheet().health, DEFAULT_HEALTH);
        assert!(m.sheet().inventory.contains(&"Blaster".to_string()));
        assert!(m.typewriter().is_animating());
    }

    #[test]
    fn test_character_needs_prompt() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(&start, CallResult::StartGame(Err(Error::Network("down".into())))));
        m.choose_universe(Universe::Fantasy.into());
        assert_eq!(m.phase(), Phase::CreatingCharacter);

        assert!(m.create_character("  ").is_none());
        assert_eq!(m.phase(), Phase::CreatingCharacter);
        assert_eq!(last_kind(&m), MessageKind::Error);
    }

    #[test]
    fn test_character_failure_uses_fallback() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        let choose = m.choose_universe(Universe::Cyberpunk.into()).unwrap();
        m.apply(reply(
            &choose,
            CallResult::ChooseUniverse(Ok(ChooseUniverseResponse {
                success: true,
                need_character: None,
                message: None,
            })),
        ));
        let create = m.create_character("Street samurai").unwrap();
        m.apply(reply(
            &create,
            CallResult::CreateCharacter(Err(Error::Api {
                status: 503,
                message: "busy".into(),
            })),
        ));

        assert_eq!(m.phase(), Phase::Playing);
        assert_eq!(m.sheet().stats, default_stats());
        assert_eq!(m.sheet().character.as_deref(), Some("Street samurai"));
        assert!(m.sheet().inventory.contains(&"Cyberdeck".to_string()));
        let kinds: Vec<MessageKind> = m
            .typewriter()
            .transcript()
            .entries()
            .iter()
            .map(|e| e.message().kind)
            .collect();
        assert!(kinds.ends_with(&[MessageKind::System, MessageKind::Narration]));
    }

    #[test]
    fn test_action_presentation() {
        let mut m = playing();
        let action = m.perform_action("pick the lock").unwrap();
        let follow_up = m.apply(reply(
            &action,
            CallResult::Action(Ok(ActionResponse {
                success: true,
                action_result: Some("The lock clicks open.".into()),
                new_items: vec!["lute".into(), "Brass key".into()],
                chance: Some(83.4),
                rolled: Some(12.0),
                outcome: Some("success".into()),
                game_over: Some(false),
                message: None,
            })),
        ));

        let texts: Vec<String> = m
            .typewriter()
            .transcript()
            .entries()
            .iter()
            .map(|e| e.message().raw_text.clone())
            .collect();
        assert!(texts.contains(&"Almost certain! (Chance: 83%)".to_string()));
        assert!(texts.contains(&"Rolled 12: success".to_string()));
        assert!(texts.contains(&"New items: Brass key".to_string()));
        assert_eq!(m.sheet().inventory, vec!["Lute", "Brass key"]);
        assert!(matches!(follow_up.map(|r| r.call), Some(Call::GetStatus(_))));
        assert_eq!(m.phase(), Phase::Playing);
    }

    #[test]
    fn test_action_rejection_shows_message() {
        let mut m = playing();
        let action = m.perform_action("fly").unwrap();
        m.apply(reply(
            &action,
            CallResult::Action(Ok(ActionResponse {
                success: false,
                message: Some("You cannot fly.".into()),
                ..ActionResponse::default()
            })),
        ));
        assert_eq!(last_kind(&m), MessageKind::Error);
        assert_eq!(last_text(&m), "You cannot fly.");
        assert_eq!(m.phase(), Phase::Playing);
    }

    #[test]
    fn test_game_over_ends_session() {
        let mut m = playing();
        let action = m.perform_action("jump into the abyss").unwrap();
        m.apply(reply(
            &action,
            CallResult::Action(Ok(ActionResponse {
                success: true,
                action_result: Some("You fall forever.".into()),
                game_over: Some(true),
                ..ActionResponse::default()
            })),
        ));
        assert_eq!(m.phase(), Phase::Ended);
        assert!(m.perform_action("climb").is_none());
        assert_eq!(last_kind(&m), MessageKind::Error);
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let mut m = playing();
        let action = m.perform_action("wait").unwrap();
        m.new_game();
        let before = m.typewriter().transcript().len();

        m.apply(reply(
            &action,
            CallResult::Action(Ok(ActionResponse {
                success: true,
                action_result: Some("Old news.".into()),
                ..ActionResponse::default()
            })),
        ));
        assert_eq!(m.typewriter().transcript().len(), before);
        assert_eq!(m.phase(), Phase::Uninitialized);
        assert!(m.is_busy(), "the new start request is still outstanding");
    }

    #[test]
    fn test_new_game_resets() {
        let mut m = playing();
        let request = m.new_game().unwrap();
        assert_eq!(request.call, Call::StartGame);
        assert_eq!(request.generation, 1);
        assert_eq!(m.phase(), Phase::Uninitialized);
        assert_eq!(m.sheet(), &CharacterSheet::default());
        assert!(m.typewriter().transcript().is_empty());
    }

    #[test]
    fn test_empty_opening_is_marked_as_fallback() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Ok(StartGameResponse {
                user_id: Some("abc".into()),
                universes: Vec::new(),
            })),
        ));
        let choose = m.choose_universe(Universe::SpaceOpera.into()).unwrap();
        m.apply(reply(
            &choose,
            CallResult::ChooseUniverse(Ok(ChooseUniverseResponse {
                success: true,
                need_character: Some(true),
                message: None,
            })),
        ));
        let create = m.create_character("A retired smuggler").unwrap();
        m.apply(reply(
            &create,
            CallResult::CreateCharacter(Ok(CreateCharacterResponse {
                success: true,
                game_started: true,
                story: "  ".into(),
                ..CreateCharacterResponse::default()
            })),
        ));

        assert_eq!(m.phase(), Phase::Playing);
        let entries = m.typewriter().transcript().entries();
        let [.., notice, opening] = entries else {
            panic!("expected a notice and an opening");
        };
        assert_eq!(notice.message().kind, MessageKind::System);
        assert!(notice.message().raw_text.contains("built-in"));
        assert_eq!(opening.message().kind, MessageKind::Narration);
        assert_eq!(opening.message().raw_text, Universe::SpaceOpera.fallback().opening);
    }

    #[test]
    fn test_offline_load_is_refused() {
        let mut m = machine();
        let start = m.start().unwrap();
        m.apply(reply(
            &start,
            CallResult::StartGame(Err(Error::Network("refused".into()))),
        ));
        assert!(m.state().offline);

        assert!(m.load(r#"{"character": "A knight"}"#).is_none());
        assert_eq!(last_kind(&m), MessageKind::Error);
        assert!(last_text(&m).contains("connection"));
        assert!(!m.is_busy());
    }

    #[test]
    fn test_malformed_save_text() {
        let mut m = playing();
        let sheet = m.sheet().clone();
        assert!(m.load("{not json").is_none());
        assert!(m.load("").is_none());
        assert_eq!(last_kind(&m), MessageKind::Error);
        assert_eq!(m.sheet(), &sheet);
        assert!(!m.is_busy());
    }

    #[test]
    fn test_save_keeps_pretty_text() {
        let mut m = playing();
        let save = m.save().unwrap();
        m.apply(reply(
            &save,
            CallResult::SaveGame(Ok(SaveGameResponse {
                success: true,
                save_data: serde_json::json!({"health": 90}),
            })),
        ));
        let text = m.last_save_text().unwrap();
        assert_eq!(parse_save_text(text).unwrap(), serde_json::json!({"health": 90}));
        assert_eq!(last_kind(&m), MessageKind::System);
    }

    #[test]
    fn test_status_failure_is_ignored() {
        let mut m = playing();
        let before = m.typewriter().transcript().len();
        let status = m.refresh_status().unwrap();
        m.apply(reply(&status, CallResult::GetStatus(Err(Error::Network("x".into())))));
        assert_eq!(m.typewriter().transcript().len(), before);
        assert_eq!(m.sheet().health, 90);

        let status = m.refresh_status().unwrap();
        let mut stats = Stats::new();
        stats.insert("Strength".into(), 12.into());
        m.apply(reply(
            &status,
            CallResult::GetStatus(Ok(StatusResponse {
                health: Some(55),
                stats,
                ..StatusResponse::default()
            })),
        ));
        assert_eq!(m.sheet().health, 55);
        assert_eq!(m.sheet().stats["Strength"], 12);
    }

    #[test]
    fn test_health_poll() {
        let mut m = machine();
        let poll = m.poll_health();
        m.apply(reply(
            &poll,
            CallResult::Health(Ok(HealthResponse {
                active_sessions: 3,
                ai_available: true,
            })),
        ));
        assert_eq!(
            m.connection(),
            ConnectionStatus::Online {
                active_sessions: 3,
                ai_available: true
            }
        );
        let poll = m.poll_health();
        m.apply(reply(&poll, CallResult::Health(Err(Error::Network("gone".into())))));
        assert_eq!(m.connection(), ConnectionStatus::Unreachable);
    }

    #[test]
    fn test_chance_tiers() {
        assert_eq!(chance_message(95.0), "Almost certain! (Chance: 95%)");
        assert_eq!(chance_message(79.6), "Almost certain! (Chance: 80%)");
        assert_eq!(chance_message(60.0), "Pretty good. (Chance: 60%)");
        assert_eq!(chance_message(45.0), "Fifty-fifty. (Chance: 45%)");
        assert_eq!(chance_message(20.0), "Risky... (Chance: 20%)");
        assert_eq!(chance_message(3.0), "Very doubtful. (Chance: 3%)");
        assert_eq!(chance_message(-10.0), "Very doubtful. (Chance: 0%)");
    }
}
