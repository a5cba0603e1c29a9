//! Enums used throughout the Mapwatch TUI
//!
//! This module contains the various enum types used for state management
//! and UI rendering.

/// Top-level view shown in the main panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Tracked, // Tracked beatmapsets with detail panel
    History, // Status change log
    Browse,  // Search results from the API
}

impl View {
    pub fn next(&self) -> Self {
        match self {
            View::Tracked => View::History,
            View::History => View::Browse,
            View::Browse => View::Tracked,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Tracked => "Tracked",
            View::History => "History",
            View::Browse => "Browse",
        }
    }
}

/// What the single-line input prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    AddBeatmap,    // Beatmapset id or URL
    Search,        // Browse query text
    ImportPath,    // JSON file to merge into history
    HistoryFilter, // Text filter for the history view
}

impl InputKind {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputKind::AddBeatmap => "Beatmapset ID or URL",
            InputKind::Search => "Search",
            InputKind::ImportPath => "Import history from",
            InputKind::HistoryFilter => "Filter history (text or URL)",
        }
    }
}

/// Severity of the message in the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Row state for rendering a tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Watching, // Enabled and still moving
    Settled,  // Reached a final status
    Paused,   // Tracking disabled
}

impl ItemState {
    pub fn of(enabled: bool, is_final: bool) -> Self {
        match (enabled, is_final) {
            (_, true) => ItemState::Settled,
            (true, false) => ItemState::Watching,
            (false, false) => ItemState::Paused,
        }
    }
}
