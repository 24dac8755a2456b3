//! The seam between the session state machine and the game server.
//!
//! The machine never performs I/O. It hands out [`Request`]s and consumes
//! [`Reply`]s; whoever owns a [`GameBackend`] runs the call in between, either
//! inline ([`crate::session::Session`]) or on a worker task (the terminal UI).

use async_trait::async_trait;
use std::fmt;

use game_api::{
    ActionRequest, ActionResponse, ChooseUniverseRequest, ChooseUniverseResponse,
    CreateCharacterRequest, CreateCharacterResponse, Error, GameApi, HealthResponse,
    LoadGameRequest, LoadGameResponse, SaveGameResponse, SessionRequest, StartGameResponse,
    StatusResponse,
};

/// Something that can answer Game API calls.
#[async_trait]
pub trait GameBackend: Send + Sync {
    async fn start_game(&self) -> Result<StartGameResponse, Error>;

    async fn choose_universe(
        &self,
        request: &ChooseUniverseRequest,
    ) -> Result<ChooseUniverseResponse, Error>;

    async fn create_character(
        &self,
        request: &CreateCharacterRequest,
    ) -> Result<CreateCharacterResponse, Error>;

    async fn action(&self, request: &ActionRequest) -> Result<ActionResponse, Error>;

    async fn get_status(&self, request: &SessionRequest) -> Result<StatusResponse, Error>;

    async fn save_game(&self, request: &SessionRequest) -> Result<SaveGameResponse, Error>;

    async fn load_game(&self, request: &LoadGameRequest) -> Result<LoadGameResponse, Error>;

    async fn health(&self) -> Result<HealthResponse, Error>;
}

#[async_trait]
impl GameBackend for GameApi {
    async fn start_game(&self) -> Result<StartGameResponse, Error> {
        GameApi::start_game(self).await
    }

    async fn choose_universe(
        &self,
        request: &ChooseUniverseRequest,
    ) -> Result<ChooseUniverseResponse, Error> {
        GameApi::choose_universe(self, request).await
    }

    async fn create_character(
        &self,
        request: &CreateCharacterRequest,
    ) -> Result<CreateCharacterResponse, Error> {
        GameApi::create_character(self, request).await
    }

    async fn action(&self, request: &ActionRequest) -> Result<ActionResponse, Error> {
        GameApi::action(self, request).await
    }

    async fn get_status(&self, request: &SessionRequest) -> Result<StatusResponse, Error> {
        GameApi::get_status(self, request).await
    }

    async fn save_game(&self, request: &SessionRequest) -> Result<SaveGameResponse, Error> {
        GameApi::save_game(self, request).await
    }

    async fn load_game(&self, request: &LoadGameRequest) -> Result<LoadGameResponse, Error> {
        GameApi::load_game(self, request).await
    }

    async fn health(&self) -> Result<HealthResponse, Error> {
        GameApi::health(self).await
    }
}

/// Game API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    StartGame,
    ChooseUniverse,
    CreateCharacter,
    Action,
    GetStatus,
    SaveGame,
    LoadGame,
    Health,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::StartGame => "/api/start-game",
            Endpoint::ChooseUniverse => "/api/choose-universe",
            Endpoint::CreateCharacter => "/api/create-character",
            Endpoint::Action => "/api/action",
            Endpoint::GetStatus => "/api/get-status",
            Endpoint::SaveGame => "/api/save-game",
            Endpoint::LoadGame => "/api/load-game",
            Endpoint::Health => "/health",
        }
    }

    /// Calls that advance the session. At most one may be outstanding.
    pub fn is_session_mutating(&self) -> bool {
        matches!(
            self,
            Endpoint::StartGame
                | Endpoint::ChooseUniverse
                | Endpoint::CreateCharacter
                | Endpoint::Action
                | Endpoint::LoadGame
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A call the state machine wants made.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartGame,
    ChooseUniverse(ChooseUniverseRequest),
    CreateCharacter(CreateCharacterRequest),
    Action(ActionRequest),
    GetStatus(SessionRequest),
    SaveGame(SessionRequest),
    LoadGame(LoadGameRequest),
    Health,
}

impl Call {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Call::StartGame => Endpoint::StartGame,
            Call::ChooseUniverse(_) => Endpoint::ChooseUniverse,
            Call::CreateCharacter(_) => Endpoint::CreateCharacter,
            Call::Action(_) => Endpoint::Action,
            Call::GetStatus(_) => Endpoint::GetStatus,
            Call::SaveGame(_) => Endpoint::SaveGame,
            Call::LoadGame(_) => Endpoint::LoadGame,
            Call::Health => Endpoint::Health,
        }
    }
}

/// What came back from a [`Call`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    StartGame(Result<StartGameResponse, Error>),
    ChooseUniverse(Result<ChooseUniverseResponse, Error>),
    CreateCharacter(Result<CreateCharacterResponse, Error>),
    Action(Result<ActionResponse, Error>),
    GetStatus(Result<StatusResponse, Error>),
    SaveGame(Result<SaveGameResponse, Error>),
    LoadGame(Result<LoadGameResponse, Error>),
    Health(Result<HealthResponse, Error>),
}

impl CallResult {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            CallResult::StartGame(_) => Endpoint::StartGame,
            CallResult::ChooseUniverse(_) => Endpoint::ChooseUniverse,
            CallResult::CreateCharacter(_) => Endpoint::CreateCharacter,
            CallResult::Action(_) => Endpoint::Action,
            CallResult::GetStatus(_) => Endpoint::GetStatus,
            CallResult::SaveGame(_) => Endpoint::SaveGame,
            CallResult::LoadGame(_) => Endpoint::LoadGame,
            CallResult::Health(_) => Endpoint::Health,
        }
    }
}

/// A call tagged with the session generation that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub generation: u64,
    pub call: Call,
}

/// The answer to a [`Request`], carrying its generation back.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub generation: u64,
    pub result: CallResult,
}

impl Reply {
    /// The reply for a request that never reached a backend.
    pub fn failed(request: Request, error: Error) -> Self {
        let result = match request.call.endpoint() {
            Endpoint::StartGame => CallResult::StartGame(Err(error)),
            Endpoint::ChooseUniverse => CallResult::ChooseUniverse(Err(error)),
            Endpoint::CreateCharacter => CallResult::CreateCharacter(Err(error)),
            Endpoint::Action => CallResult::Action(Err(error)),
            Endpoint::GetStatus => CallResult::GetStatus(Err(error)),
            Endpoint::SaveGame => CallResult::SaveGame(Err(error)),
            Endpoint::LoadGame => CallResult::LoadGame(Err(error)),
            Endpoint::Health => CallResult::Health(Err(error)),
        };
        Self {
            generation: request.generation,
            result,
        }
    }
}

/// Run one request against a backend.
pub async fn execute<B: GameBackend + ?Sized>(backend: &B, request: Request) -> Reply {
    let Request { generation, call } = request;
    tracing::debug!(endpoint = %call.endpoint(), generation, "executing call");

    let result = match call {
        Call::StartGame => CallResult::StartGame(backend.start_game().await),
        Call::ChooseUniverse(body) => CallResult::ChooseUniverse(backend.choose_universe(&body).await),
        Call::CreateCharacter(body) => {
            CallResult::CreateCharacter(backend.create_character(&body).await)
        }
        Call::Action(body) => CallResult::Action(backend.action(&body).await),
        Call::GetStatus(body) => CallResult::GetStatus(backend.get_status(&body).await),
        Call::SaveGame(body) => CallResult::SaveGame(backend.save_game(&body).await),
        Call::LoadGame(body) => CallResult::LoadGame(backend.load_game(&body).await),
        Call::Health => CallResult::Health(backend.health().await),
    };

    Reply { generation, result }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_endpoints() {
        let guarded: Vec<Endpoint> = [
            Endpoint::StartGame,
            Endpoint::ChooseUniverse,
            Endpoint::CreateCharacter,
            Endpoint::Action,
            Endpoint::GetStatus,
            Endpoint::SaveGame,
            Endpoint::LoadGame,
            Endpoint::Health,
        ]
        .into_iter()
        .filter(Endpoint::is_session_mutating)
        .collect();
        assert_eq!(guarded.len(), 5);
        assert!(!guarded.contains(&Endpoint::GetStatus));
        assert!(!guarded.contains(&Endpoint::Health));
    }

    #[test]
    fn test_call_endpoints() {
        let call = Call::Action(ActionRequest {
            user_id: "u".into(),
            action: "look".into(),
        });
        assert_eq!(call.endpoint(), Endpoint::Action);
        assert_eq!(call.endpoint().path(), "/api/action");
    }

    #[test]
    fn test_failed_reply_matches_call() {
        let request = Request {
            generation: 4,
            call: Call::Health,
        };
        let reply = Reply::failed(request, Error::Network("worker stopped".into()));
        assert_eq!(reply.generation, 4);
        assert_eq!(reply.result.endpoint(), Endpoint::Health);
    }
}
