//! Data models for Mapwatch TUI
//!
//! This module contains the core data structures:
//! - Ranked status and game mode enums
//! - Beatmapset metadata and tracked items
//! - History entries for observed status changes
//! - Enums for UI state management

pub mod beatmap;
pub mod enums;
pub mod history;
pub mod status;

// Re-exports for convenient access
pub use beatmap::{BeatmapInfo, Difficulty, TrackedItem};
pub use enums::{InputKind, ItemState, StatusLevel, View};
pub use history::{HistoryEntry, HistoryFilter};
pub use status::{GameMode, RankStatus};
