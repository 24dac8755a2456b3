//! Universe presets and offline fallback content.
//!
//! Every preset carries enough canned story to keep a session going when the
//! game server cannot: an opening scene, a rotation of action outcomes and a
//! starting inventory.

use serde::{Deserialize, Serialize};
use std::fmt;

use game_api::Stats;

/// Starting health for synthesized characters.
pub const DEFAULT_HEALTH: i32 = 100;

/// Default stat block, in display order.
pub const DEFAULT_STATS: [(&str, i64); 5] = [
    ("Strength", 8),
    ("Agility", 7),
    ("Intellect", 6),
    ("Wisdom", 5),
    ("Charisma", 4),
];

/// Stat block used when the server provides none.
pub fn default_stats() -> Stats {
    DEFAULT_STATS
        .iter()
        .map(|(name, value)| (name.to_string(), serde_json::Value::from(*value)))
        .collect()
}

/// Identifier of a universe as the game server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniverseId(String);

impl UniverseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The preset this id names, if any.
    pub fn preset(&self) -> Option<Universe> {
        Universe::from_id(&self.0)
    }

    pub fn is_custom(&self) -> bool {
        self.preset() == Some(Universe::Custom)
    }
}

impl fmt::Display for UniverseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Universe> for UniverseId {
    fn from(universe: Universe) -> Self {
        Self::new(universe.id())
    }
}

/// Built-in universes offered on the selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Universe {
    Fantasy,
    Cyberpunk,
    SpaceOpera,
    /// User-authored rules.
    Custom,
}

/// Canned story for playing without the server.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContent {
    pub opening: &'static str,
    pub action_narratives: &'static [&'static str],
    pub inventory: &'static [&'static str],
}

impl FallbackContent {
    /// Narrative for the `turn`-th offline action, cycling through the list.
    pub fn action_narrative(&self, turn: usize) -> &'static str {
        match self.action_narratives.len() {
            0 => "Time passes.",
            len => self.action_narratives[turn % len],
        }
    }

    pub fn inventory(&self) -> Vec<String> {
        self.inventory.iter().map(|item| item.to_string()).collect()
    }
}

impl Universe {
    /// Selection order.
    pub const ALL: [Universe; 4] = [
        Universe::Fantasy,
        Universe::Cyberpunk,
        Universe::SpaceOpera,
        Universe::Custom,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Universe::Fantasy => "fantasy",
            Universe::Cyberpunk => "cyberpunk",
            Universe::SpaceOpera => "space_opera",
            Universe::Custom => "custom",
        }
    }

    pub fn from_id(id: &str) -> Option<Universe> {
        let id = id.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Universe::ALL.into_iter().find(|u| u.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Universe::Fantasy => "Fantasy",
            Universe::Cyberpunk => "Cyberpunk",
            Universe::SpaceOpera => "Space Opera",
            Universe::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Universe::Fantasy => "Swords, sorcery and forgotten kingdoms.",
            Universe::Cyberpunk => "Neon streets, megacorps and chrome implants.",
            Universe::SpaceOpera => "Starships, empires and alien frontiers.",
            Universe::Custom => "Write the rules of your own world.",
        }
    }

    /// Ruleset blurb shown in the universe menu. Custom has none of its own.
    pub fn ruleset(&self) -> Option<&'static str> {
        match self {
            Universe::Fantasy => Some(
                "A medieval world of magic and monsters. Steel and spells decide most \
                 conflicts, gods are real but distant, and old ruins hide older dangers.",
            ),
            Universe::Cyberpunk => Some(
                "A sprawling megacity in the near future. Corporations own the law, \
                 implants can be hacked, and every favor has a price.",
            ),
            Universe::SpaceOpera => Some(
                "A galaxy of rival empires and free traders. Ships jump between systems, \
                 alien species keep their own customs, and war is always one treaty away.",
            ),
            Universe::Custom => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Universe::Custom)
    }

    pub fn fallback(&self) -> FallbackContent {
        match self {
            Universe::Fantasy => FallbackContent {
                opening: "You wake at the edge of a misty forest. The road behind you is gone, \
                    and somewhere ahead a bell tolls from a village you do not remember. \
                    Your pack is light, your blade is sharp, and the day is young.",
                action_narratives: &[
                    "The forest seems to listen. A crow watches you from a twisted branch, then \
                     takes off toward the hills.",
                    "You press on. The path narrows between mossy stones carved with runes that \
                     glow faintly as you pass.",
                    "A distant howl rolls across the valley. Whatever made it is still far away, \
                     for now.",
                ],
                inventory: &["Short sword", "Travel cloak", "Waterskin", "Torch"],
            },
            Universe::Cyberpunk => FallbackContent {
                opening: "Rain hammers the neon signs of District 9. Your implant flickers with \
                    a message from an unknown number: *the job is yours if you want it*. \
                    Somewhere below, a drone siren wails.",
                action_narratives: &[
                    "The crowd parts around you without a glance. In this city, nobody wants to \
                     know your business.",
                    "Your implant pings. A new route lights up on your retina, straight through \
                     corporate territory.",
                    "Static crackles in your ear. Someone is tracing your signal, and they are \
                     getting closer.",
                ],
                inventory: &["Cyberdeck", "Credstick", "Smart pistol", "Stim patch"],
            },
            Universe::SpaceOpera => FallbackContent {
                opening: "The hull of your freighter groans as it drops out of hyperspace above \
                    an unfamiliar planet. The nav computer blinks: *signal detected*. \
                    Your crew looks to you for orders.",
                action_narratives: &[
                    "The ship's sensors sweep the system. Far off, a fleet of unknown vessels \
                     holds a silent formation.",
                    "A transmission arrives in a language your translator barely understands. \
                     The tone, at least, is friendly.",
                    "Alarms sound on the lower deck. Something came aboard at the last station.",
                ],
                inventory: &["Blaster", "Data pad", "Medkit", "Ration pack"],
            },
            Universe::Custom => FallbackContent {
                opening: "Your world takes shape around you, exactly as you imagined it. \
                    The story waits for your first move.",
                action_narratives: &[
                    "The world responds to your choice in ways you did not expect.",
                    "Your actions ripple outward. Somewhere, someone takes notice.",
                    "A moment of calm settles in before the next turn of events.",
                ],
                inventory: &["Notebook", "Lantern", "Small pouch of coins"],
            },
        }
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fallback content for any universe id. Ids the client does not know get the
/// generic content of the custom universe.
pub fn fallback_for(id: Option<&UniverseId>) -> FallbackContent {
    id.and_then(UniverseId::preset)
        .unwrap_or(Universe::Custom)
        .fallback()
}
