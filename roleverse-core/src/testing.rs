//! Testing utilities for the RoleVerse client.
//!
//! This module provides tools for integration testing:
//! - `ScriptedBackend`, a stand-in game server with scripted replies
//! - call recording so tests can assert on what was sent

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use game_api::{
    ActionRequest, ActionResponse, ChooseUniverseRequest, ChooseUniverseResponse,
    CreateCharacterRequest, CreateCharacterResponse, Error, GameData, HealthResponse,
    LoadGameRequest, LoadGameResponse, SaveGameResponse, SessionRequest, StartGameResponse,
    StatusResponse, UniverseSummary,
};

use crate::backend::{Call, Endpoint, GameBackend};
use crate::universe::{default_stats, Universe, DEFAULT_HEALTH};

/// Session id handed out by a cooperative [`ScriptedBackend`].
pub const SCRIPTED_SESSION_ID: &str = "scripted-session";

/// A game server double.
///
/// Replies pushed with the `push_*` methods are returned in order, one per
/// call to that endpoint. Once an endpoint's script runs dry it answers like
/// a cooperative server. The saved game is remembered, so save and load
/// round-trip. An unreachable backend fails every call with a network error.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

#[derive(Default)]
struct Script {
    unreachable: bool,
    calls: Vec<Call>,
    game: GameData,
    start: VecDeque<Result<StartGameResponse, Error>>,
    choose_universe: VecDeque<Result<ChooseUniverseResponse, Error>>,
    create_character: VecDeque<Result<CreateCharacterResponse, Error>>,
    action: VecDeque<Result<ActionResponse, Error>>,
    status: VecDeque<Result<StatusResponse, Error>>,
    save: VecDeque<Result<SaveGameResponse, Error>>,
    load: VecDeque<Result<LoadGameResponse, Error>>,
    health: VecDeque<Result<HealthResponse, Error>>,
}

impl ScriptedBackend {
    /// A cooperative server.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server that never answers.
    pub fn unreachable() -> Self {
        let backend = Self::default();
        backend.set_unreachable(true);
        backend
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.script().unreachable = unreachable;
    }

    pub fn push_start(&self, reply: Result<StartGameResponse, Error>) -> &Self {
        self.script().start.push_back(reply);
        self
    }

    pub fn push_choose_universe(&self, reply: Result<ChooseUniverseResponse, Error>) -> &Self {
        self.script().choose_universe.push_back(reply);
        self
    }

    pub fn push_create_character(&self, reply: Result<CreateCharacterResponse, Error>) -> &Self {
        self.script().create_character.push_back(reply);
        self
    }

    pub fn push_action(&self, reply: Result<ActionResponse, Error>) -> &Self {
        self.script().action.push_back(reply);
        self
    }

    pub fn push_status(&self, reply: Result<StatusResponse, Error>) -> &Self {
        self.script().status.push_back(reply);
        self
    }

    pub fn push_save(&self, reply: Result<SaveGameResponse, Error>) -> &Self {
        self.script().save.push_back(reply);
        self
    }

    pub fn push_load(&self, reply: Result<LoadGameResponse, Error>) -> &Self {
        self.script().load.push_back(reply);
        self
    }

    pub fn push_health(&self, reply: Result<HealthResponse, Error>) -> &Self {
        self.script().health.push_back(reply);
        self
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.script().calls.iter().map(Call::endpoint).collect()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call, then answer from the script or fall back to `default`.
    fn answer<T>(
        &self,
        call: Call,
        queue: impl FnOnce(&mut Script) -> &mut VecDeque<Result<T, Error>>,
        default: impl FnOnce(&mut Script) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let endpoint = call.endpoint();
        let mut script = self.script();
        script.calls.push(call);
        if script.unreachable {
            return Err(Error::Network(format!("{endpoint}: connection refused")));
        }
        match queue(&mut *script).pop_front() {
            Some(reply) => reply,
            None => default(&mut *script),
        }
    }
}

fn starting_game() -> GameData {
    GameData {
        health: Some(DEFAULT_HEALTH),
        inventory: vec!["Backpack".to_string(), "Lantern".to_string()],
        stats: default_stats(),
        abilities: vec!["Keen eye".to_string()],
        character: None,
        world_context: None,
    }
}

#[async_trait]
impl GameBackend for ScriptedBackend {
    async fn start_game(&self) -> Result<StartGameResponse, Error> {
        self.answer(
            Call::StartGame,
            |s| &mut s.start,
            |_| {
                Ok(StartGameResponse {
                    user_id: Some(SCRIPTED_SESSION_ID.to_string()),
                    universes: Universe::ALL
                        .iter()
                        .map(|u| UniverseSummary {
                            id: u.id().to_string(),
                            name: u.name().to_string(),
                            description: u.description().to_string(),
                        })
                        .collect(),
                })
            },
        )
    }

    async fn choose_universe(
        &self,
        request: &ChooseUniverseRequest,
    ) -> Result<ChooseUniverseResponse, Error> {
        self.answer(
            Call::ChooseUniverse(request.clone()),
            |s| &mut s.choose_universe,
            |_| {
                Ok(ChooseUniverseResponse {
                    success: true,
                    need_character: Some(true),
                    message: None,
                })
            },
        )
    }

    async fn create_character(
        &self,
        request: &CreateCharacterRequest,
    ) -> Result<CreateCharacterResponse, Error> {
        let prompt = request.character_prompt.clone();
        self.answer(
            Call::CreateCharacter(request.clone()),
            |s| &mut s.create_character,
            move |s| {
                s.game = GameData {
                    character: Some(prompt),
                    ..starting_game()
                };
                Ok(CreateCharacterResponse {
                    success: true,
                    game_started: true,
                    story: "Your adventure begins at a crossroads.".to_string(),
                    inventory: s.game.inventory.clone(),
                    stats: s.game.stats.clone(),
                    abilities: s.game.abilities.clone(),
                    health: s.game.health,
                    message: None,
                })
            },
        )
    }

    async fn action(&self, request: &ActionRequest) -> Result<ActionResponse, Error> {
        self.answer(
            Call::Action(request.clone()),
            |s| &mut s.action,
            |_| {
                Ok(ActionResponse {
                    success: true,
                    action_result: Some("The world shifts in response.".to_string()),
                    ..ActionResponse::default()
                })
            },
        )
    }

    async fn get_status(&self, request: &SessionRequest) -> Result<StatusResponse, Error> {
        self.answer(
            Call::GetStatus(request.clone()),
            |s| &mut s.status,
            |s| {
                Ok(StatusResponse {
                    health: s.game.health,
                    inventory: s.game.inventory.clone(),
                    stats: s.game.stats.clone(),
                    character: s.game.character.clone(),
                    world_context: s.game.world_context.clone(),
                })
            },
        )
    }

    async fn save_game(&self, request: &SessionRequest) -> Result<SaveGameResponse, Error> {
        self.answer(
            Call::SaveGame(request.clone()),
            |s| &mut s.save,
            |s| {
                let save_data =
                    serde_json::to_value(&s.game).map_err(|e| Error::Parse(e.to_string()))?;
                Ok(SaveGameResponse {
                    success: true,
                    save_data,
                })
            },
        )
    }

    async fn load_game(&self, request: &LoadGameRequest) -> Result<LoadGameResponse, Error> {
        let save_data = request.save_data.clone();
        self.answer(
            Call::LoadGame(request.clone()),
            |s| &mut s.load,
            move |s| match serde_json::from_value::<GameData>(save_data) {
                Ok(game) => {
                    s.game = game.clone();
                    Ok(LoadGameResponse {
                        success: true,
                        game_data: Some(game),
                        message: None,
                    })
                }
                Err(e) => Ok(LoadGameResponse {
                    success: false,
                    game_data: None,
                    message: Some(format!("corrupt save: {e}")),
                }),
            },
        )
    }

    async fn health(&self) -> Result<HealthResponse, Error> {
        self.answer(
            Call::Health,
            |s| &mut s.health,
            |_| {
                Ok(HealthResponse {
                    active_sessions: 1,
                    ai_available: true,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_come_first() {
        let backend = ScriptedBackend::new();
        backend.push_start(Ok(StartGameResponse::default()));

        let first = backend.start_game().await.unwrap();
        assert_eq!(first.user_id, None);
        let second = backend.start_game().await.unwrap();
        assert_eq!(second.user_id.as_deref(), Some(SCRIPTED_SESSION_ID));
        assert_eq!(backend.call_count(Endpoint::StartGame), 2);
    }

    #[tokio::test]
    async fn test_unreachable_records_calls() {
        let backend = ScriptedBackend::unreachable();
        assert!(matches!(backend.health().await, Err(Error::Network(_))));
        assert_eq!(backend.endpoints(), vec![Endpoint::Health]);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let backend = ScriptedBackend::new();
        let session = SessionRequest::new(SCRIPTED_SESSION_ID);
        let saved = backend.save_game(&session).await.unwrap();
        let loaded = backend
            .load_game(&LoadGameRequest {
                user_id: SCRIPTED_SESSION_ID.to_string(),
                save_data: saved.save_data,
            })
            .await
            .unwrap();
        assert!(loaded.success);
        assert_eq!(loaded.game_data, Some(GameData::default()));
    }
}
