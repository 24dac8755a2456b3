//! TUI widgets for RoleVerse

pub mod character_panel;
pub mod input;
pub mod narrative;
pub mod status_bar;

pub use character_panel::CharacterPanelWidget;
pub use input::InputWidget;
pub use narrative::NarrativeWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
