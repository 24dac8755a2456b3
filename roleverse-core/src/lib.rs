//! Core of the RoleVerse text role-playing client.
//!
//! This crate provides:
//! - A typewriter renderer that reveals story text one character at a time
//! - Safe markup formatting for story text
//! - The session state machine that talks to the game server
//! - Offline fallback content for every universe
//!
//! # Quick Start
//!
//! ```ignore
//! use roleverse_core::{Session, Universe};
//! use game_api::GameApi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(GameApi::local()?);
//!     session.start().await;
//!     session.choose_universe(Universe::Fantasy).await;
//!     session.create_character("A retired knight with a bad knee").await;
//!     session.perform_action("I look around the tavern").await;
//!
//!     for entry in session.machine().typewriter().transcript().entries() {
//!         println!("{}", entry.message().raw_text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod markup;
pub mod message;
pub mod pacing;
pub mod scheduler;
pub mod segment;
pub mod session;
pub mod testing;
pub mod typewriter;
pub mod universe;

// Primary public API
pub use backend::{execute, Call, CallResult, Endpoint, GameBackend, Reply, Request};
pub use markup::{format_text, parse_markup, MarkupLine, Segment, TextStyle};
pub use message::{Message, MessageKind};
pub use pacing::{DelayPolicy, FixedPacing, NaturalPacing};
pub use scheduler::{Scheduler, TimerId, TimerQueue};
pub use session::{
    CharacterSheet, ConnectionStatus, Phase, Session, SessionError, SessionMachine, SessionState,
};
pub use testing::ScriptedBackend;
pub use typewriter::{
    AnimationHandle, AnimationOptions, Entry, MessageId, RenderEvent, Transcript, Typewriter,
};
pub use universe::{Universe, UniverseId};
