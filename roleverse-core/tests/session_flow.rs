//! Session scenarios against a scripted game server.
//!
//! Run with: `cargo test -p roleverse-core --test session_flow`

use std::time::Duration;

use game_api::{ActionResponse, ChooseUniverseResponse, Error, StatusResponse};
use roleverse_core::testing::SCRIPTED_SESSION_ID;
use roleverse_core::{
    Call, Endpoint, FixedPacing, MessageKind, Phase, ScriptedBackend, Session, Typewriter,
    Universe,
};

fn session(backend: ScriptedBackend) -> Session<ScriptedBackend> {
    Session::with_typewriter(backend, Typewriter::new().with_pacing(FixedPacing))
}

/// Kinds of every transcript entry, oldest first.
fn kinds(session: &Session<ScriptedBackend>) -> Vec<MessageKind> {
    session
        .machine()
        .typewriter()
        .transcript()
        .entries()
        .iter()
        .map(|entry| entry.message().kind)
        .collect()
}

fn texts(session: &Session<ScriptedBackend>) -> Vec<String> {
    session
        .machine()
        .typewriter()
        .transcript()
        .entries()
        .iter()
        .map(|entry| entry.message().raw_text.clone())
        .collect()
}

async fn playing(backend: ScriptedBackend) -> Session<ScriptedBackend> {
    let mut session = session(backend);
    session.start().await;
    session.choose_universe(Universe::Fantasy).await;
    session.create_character("A one-eyed smuggler").await;
    assert_eq!(session.machine().phase(), Phase::Playing);
    session
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_full_online_flow() {
    let mut session = playing(ScriptedBackend::new()).await;

    assert_eq!(
        session.machine().state().session_id.as_deref(),
        Some(SCRIPTED_SESSION_ID)
    );
    assert_eq!(
        session.backend().endpoints(),
        vec![Endpoint::StartGame, Endpoint::ChooseUniverse, Endpoint::CreateCharacter]
    );
    assert_eq!(
        session.machine().sheet().character.as_deref(),
        Some("A one-eyed smuggler")
    );

    session.perform_action("I search the docks").await;
    let endpoints = session.backend().endpoints();
    assert_eq!(&endpoints[3..], &[Endpoint::Action, Endpoint::GetStatus]);
    assert!(!session.machine().is_busy());
}

#[tokio::test]
async fn test_story_animates_to_completion() {
    let mut session = playing(ScriptedBackend::new()).await;
    let typewriter = session.machine_mut().typewriter_mut();
    assert!(typewriter.is_animating());

    for _ in 0..1_000 {
        if !typewriter.is_animating() {
            break;
        }
        typewriter.advance(Duration::from_millis(50));
    }

    let story = typewriter.transcript().last().unwrap();
    assert!(story.is_complete());
    assert_eq!(story.message().kind, MessageKind::Narration);
    assert_eq!(story.visible_text(), "Your adventure begins at a crossroads.");
}

// =============================================================================
// Local validation
// =============================================================================

#[tokio::test]
async fn test_empty_action_is_rejected_locally() {
    let mut session = playing(ScriptedBackend::new()).await;
    let calls_before = session.backend().calls().len();
    let entries_before = kinds(&session).len();

    session.perform_action("   ").await;

    assert_eq!(session.backend().calls().len(), calls_before);
    let kinds = kinds(&session);
    assert_eq!(kinds.len(), entries_before + 1);
    assert_eq!(kinds.last(), Some(&MessageKind::Error));
    assert_eq!(session.machine().phase(), Phase::Playing);
}

#[tokio::test]
async fn test_skip_with_nothing_animating_is_noop() {
    let mut session = session(ScriptedBackend::new());
    session.start().await;
    let before = texts(&session);

    let typewriter = session.machine_mut().typewriter_mut();
    typewriter.drain_events();
    assert!(!typewriter.is_animating());
    assert!(!typewriter.skip_active());
    assert!(typewriter.drain_events().is_empty());

    assert_eq!(texts(&session), before);
}

// =============================================================================
// Fallbacks
// =============================================================================

#[tokio::test]
async fn test_choose_universe_failure_falls_back() {
    let backend = ScriptedBackend::new();
    backend.push_choose_universe(Err(Error::Network("connection reset".into())));
    let mut session = session(backend);

    session.start().await;
    session.choose_universe(Universe::Cyberpunk).await;

    assert_eq!(session.machine().phase(), Phase::CreatingCharacter);
    assert_eq!(
        session.machine().state().selected_universe,
        Some(Universe::Cyberpunk.into())
    );
    let notice = texts(&session).pop().unwrap();
    assert!(notice.contains("built-in content"), "got {notice:?}");
    assert_eq!(kinds(&session).last(), Some(&MessageKind::System));
}

#[tokio::test]
async fn test_declined_universe_falls_back() {
    let backend = ScriptedBackend::new();
    backend.push_choose_universe(Ok(ChooseUniverseResponse {
        success: false,
        need_character: None,
        message: Some("unknown universe".into()),
    }));
    let mut session = session(backend);

    session.start().await;
    session.choose_universe(Universe::SpaceOpera).await;
    assert_eq!(session.machine().phase(), Phase::CreatingCharacter);
}

#[tokio::test]
async fn test_offline_session_plays_locally() {
    let mut session = session(ScriptedBackend::unreachable());

    session.start().await;
    assert!(session.machine().state().offline);
    assert_eq!(session.machine().phase(), Phase::SelectingUniverse);

    session.choose_universe(Universe::Fantasy).await;
    session.create_character("A lost squire").await;
    session.perform_action("Follow the bell").await;
    session.perform_action("Rest by the road").await;

    assert_eq!(session.machine().phase(), Phase::Playing);
    assert_eq!(session.backend().endpoints(), vec![Endpoint::StartGame]);

    let content = Universe::Fantasy.fallback();
    let texts = texts(&session);
    assert!(texts.contains(&content.opening.to_string()));
    assert!(texts.contains(&content.action_narrative(0).to_string()));
    assert!(texts.contains(&content.action_narrative(1).to_string()));
    assert_eq!(session.machine().sheet().inventory, content.inventory());
}

#[tokio::test]
async fn test_failed_action_uses_offline_outcome() {
    let backend = ScriptedBackend::new();
    backend.push_action(Err(Error::Api {
        status: 502,
        message: "bad gateway".into(),
    }));
    let mut session = playing(backend).await;

    session.perform_action("Open the chest").await;

    let narration = texts(&session).pop().unwrap();
    assert_eq!(narration, Universe::Fantasy.fallback().action_narrative(0));
    assert_eq!(session.backend().call_count(Endpoint::GetStatus), 0);
    assert_eq!(session.machine().phase(), Phase::Playing);
}

// =============================================================================
// Status, save and load
// =============================================================================

#[tokio::test]
async fn test_status_refresh_updates_sheet() {
    let backend = ScriptedBackend::new();
    backend
        .push_action(Ok(ActionResponse {
            success: true,
            action_result: Some("A rat bites you.".into()),
            ..ActionResponse::default()
        }))
        .push_status(Ok(StatusResponse {
            health: Some(87),
            ..StatusResponse::default()
        }));
    let mut session = playing(backend).await;

    session.perform_action("Reach into the barrel").await;
    assert_eq!(session.machine().sheet().health, 87);
}

#[tokio::test]
async fn test_save_load_round_trip() {
    let backend = ScriptedBackend::new();
    let mut session = playing(backend).await;

    session.save().await;
    let saved_sheet = session.machine().sheet().clone();
    let save_text = session
        .machine()
        .last_save_text()
        .expect("save text after saving")
        .to_string();

    session
        .backend()
        .push_action(Ok(ActionResponse {
            success: true,
            action_result: Some("You find a rope.".into()),
            new_items: vec!["Rope".into()],
            ..ActionResponse::default()
        }))
        .push_status(Ok(StatusResponse {
            health: Some(40),
            ..StatusResponse::default()
        }));
    session.perform_action("Search the cellar").await;
    assert_ne!(session.machine().sheet(), &saved_sheet);

    session.load(&save_text).await;

    let sheet = session.machine().sheet();
    assert_eq!(sheet.inventory, saved_sheet.inventory);
    assert_eq!(sheet.stats, saved_sheet.stats);
    assert_eq!(sheet.health, saved_sheet.health);
    assert_eq!(session.machine().phase(), Phase::Playing);
}

#[tokio::test]
async fn test_malformed_save_makes_no_call() {
    let mut session = playing(ScriptedBackend::new()).await;
    session.load("this is not a save").await;

    assert_eq!(session.backend().call_count(Endpoint::LoadGame), 0);
    assert_eq!(kinds(&session).last(), Some(&MessageKind::Error));
}

#[tokio::test]
async fn test_new_game_starts_over() {
    let mut session = playing(ScriptedBackend::new()).await;
    session.new_game().await;

    assert_eq!(session.machine().phase(), Phase::SelectingUniverse);
    assert_eq!(session.machine().generation(), 1);
    assert_eq!(kinds(&session), vec![MessageKind::System]);
    assert!(matches!(
        session.backend().calls().last(),
        Some(Call::StartGame)
    ));
}

#[tokio::test]
async fn test_health_poll_tracks_reachability() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend);
    session.poll_health().await;
    assert!(matches!(
        session.machine().connection(),
        roleverse_core::ConnectionStatus::Online { .. }
    ));

    session.backend().set_unreachable(true);
    session.poll_health().await;
    assert_eq!(
        session.machine().connection(),
        roleverse_core::ConnectionStatus::Unreachable
    );
}
