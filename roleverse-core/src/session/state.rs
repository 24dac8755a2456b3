//! Session bookkeeping owned by the state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use game_api::{GameData, Stats, StatusResponse};

use crate::universe::{default_stats, FallbackContent, UniverseId, DEFAULT_HEALTH};

/// Where the player is in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No session id yet.
    #[default]
    Uninitialized,
    SelectingUniverse,
    CreatingCharacter,
    Playing,
    Ended,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "Connecting",
            Phase::SelectingUniverse => "Choose a universe",
            Phase::CreatingCharacter => "Create a character",
            Phase::Playing => "Playing",
            Phase::Ended => "The End",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity and progress of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: Option<String>,
    pub phase: Phase,
    pub selected_universe: Option<UniverseId>,
    /// The session id was minted locally because the server was unreachable.
    pub offline: bool,
}

/// The player character as shown in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSheet {
    pub character: Option<String>,
    pub inventory: Vec<String>,
    pub stats: Stats,
    pub abilities: Vec<String>,
    pub health: i32,
    pub world_context: Option<String>,
}

impl Default for CharacterSheet {
    fn default() -> Self {
        Self {
            character: None,
            inventory: Vec::new(),
            stats: Stats::new(),
            abilities: Vec::new(),
            health: DEFAULT_HEALTH,
            world_context: None,
        }
    }
}

impl CharacterSheet {
    /// A starting character built from canned content.
    pub fn from_fallback(character: Option<String>, content: &FallbackContent) -> Self {
        Self {
            character,
            inventory: content.inventory(),
            stats: default_stats(),
            ..Self::default()
        }
    }

    /// Replace everything with data restored from a save.
    pub fn restore(&mut self, data: GameData) {
        self.health = data.health.unwrap_or(DEFAULT_HEALTH);
        self.inventory = data.inventory;
        self.stats = if data.stats.is_empty() {
            default_stats()
        } else {
            data.stats
        };
        self.abilities = data.abilities;
        self.character = data.character;
        self.world_context = data.world_context;
    }

    /// Fold a status report in. Absent fields keep their current value.
    pub fn update(&mut self, status: StatusResponse) {
        if let Some(health) = status.health {
            self.health = health;
        }
        if !status.inventory.is_empty() {
            self.inventory = status.inventory;
        }
        if !status.stats.is_empty() {
            self.stats = status.stats;
        }
        if status.character.is_some() {
            self.character = status.character;
        }
        if status.world_context.is_some() {
            self.world_context = status.world_context;
        }
    }

    /// Add items not already carried, ignoring case. Returns what was added.
    pub fn merge_items<I, T>(&mut self, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut added = Vec::new();
        for item in items {
            let item = item.as_ref().trim();
            if item.is_empty() {
                continue;
            }
            let carried = self
                .inventory
                .iter()
                .any(|existing| existing.to_lowercase() == item.to_lowercase());
            if !carried {
                self.inventory.push(item.to_string());
                added.push(item.to_string());
            }
        }
        added
    }
}

/// Reachability of the game server, from the periodic health poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Online {
        active_sessions: u64,
        ai_available: bool,
    },
    Unreachable,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Unknown => f.write_str("checking server"),
            ConnectionStatus::Online {
                active_sessions,
                ai_available: true,
            } => write!(f, "online ({active_sessions} sessions)"),
            ConnectionStatus::Online {
                ai_available: false,
                ..
            } => f.write_str("online, AI unavailable"),
            ConnectionStatus::Unreachable => f.write_str("server unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::Universe;

    #[test]
    fn test_merge_items_ignores_case_and_duplicates() {
        let mut sheet = CharacterSheet {
            inventory: vec!["Rope".to_string()],
            ..CharacterSheet::default()
        };
        let added = sheet.merge_items(["rope", " Lantern ", "", "lantern", "Map"]);
        assert_eq!(added, vec!["Lantern", "Map"]);
        assert_eq!(sheet.inventory, vec!["Rope", "Lantern", "Map"]);
    }

    #[test]
    fn test_fallback_sheet() {
        let sheet = CharacterSheet::from_fallback(None, &Universe::Cyberpunk.fallback());
        assert_eq!(sheet.health, DEFAULT_HEALTH);
        assert_eq!(sheet.stats, default_stats());
        assert!(sheet.inventory.contains(&"Cyberdeck".to_string()));
    }

    #[test]
    fn test_status_update_keeps_missing_fields() {
        let mut sheet = CharacterSheet::from_fallback(Some("Mira".into()), &Universe::Fantasy.fallback());
        sheet.update(StatusResponse {
            health: Some(42),
            ..StatusResponse::default()
        });
        assert_eq!(sheet.health, 42);
        assert_eq!(sheet.character.as_deref(), Some("Mira"));
        assert!(!sheet.inventory.is_empty());
    }

    #[test]
    fn test_restore_replaces_everything() {
        let mut sheet = CharacterSheet::from_fallback(Some("Old".into()), &Universe::Fantasy.fallback());
        sheet.restore(GameData {
            health: Some(7),
            inventory: vec!["Key".into()],
            character: Some("New".into()),
            ..GameData::default()
        });
        assert_eq!(sheet.health, 7);
        assert_eq!(sheet.inventory, vec!["Key"]);
        assert_eq!(sheet.character.as_deref(), Some("New"));
        assert_eq!(sheet.stats, default_stats());
    }
}
