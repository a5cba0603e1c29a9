//! Application state and core logic for the Mapwatch TUI.
//!
//! This module contains the `App` struct which holds all state for the
//! interactive terminal UI: the registry, the history log, the worker
//! channels, and navigation/view state. Everything here runs on the UI
//! thread; network work is delegated to the worker.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::api::{ApiError, SearchPage, SearchQuery};
use crate::config::{ConfigFile, ConfigStore, SessionOverrides, Settings};
use crate::models::{
    BeatmapInfo, HistoryEntry, HistoryFilter, InputKind, StatusLevel, TrackedItem, View,
};
use crate::notifier::{Notifier, TerminalBell};
use crate::poller::{apply_auto_stop, apply_outcomes, PollOutcome, PollSchedule};
use crate::registry::{parse_beatmapset_id, Registry, RegistryError};
use crate::utils::display_offset;
use crate::watcher::take_reload_flag;
use crate::worker::{WorkerCommand, WorkerEvent, WorkerHandle};

const ANIMATION_INTERVAL: Duration = Duration::from_millis(150);

/// Message shown in the status line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

/// Single-line text input
#[derive(Debug, Clone, PartialEq)]
pub struct InputPrompt {
    pub kind: InputKind,
    pub buffer: String,
}

/// Browse view state
#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    pub query: SearchQuery,
    pub results: Vec<BeatmapInfo>,
    pub next_cursor: Option<String>,
    pub selected: usize,
    pub loading: bool,
}

/// Application state
pub struct App {
    pub config_store: ConfigStore,
    pub settings: Settings,
    pub overrides: SessionOverrides,
    pub registry: Registry,
    pub notifier: Notifier<TerminalBell>,
    /// Cached copy of the history log, newest first
    pub history: Vec<HistoryEntry>,
    pub history_filter: HistoryFilter,
    worker: WorkerHandle,
    pub schedule: PollSchedule,
    pub monitoring: bool,
    pub view: View,
    pub input: Option<InputPrompt>,
    // Selected tracked item (index into registry.list())
    pub selected_index: usize,
    // Selected row of the filtered history table
    pub history_scroll: usize,
    pub browse: BrowseState,
    pub pending_lookups: HashSet<u64>,
    pub status: StatusMessage,
    pub last_check: Option<DateTime<Utc>>,
    pub config_needs_reload: Arc<Mutex<bool>>,
    pub should_quit: bool,
    // Animation state
    pub animation_tick: u64,
    pub last_animation_update: Instant,
}

impl App {
    pub fn new(
        config_store: ConfigStore,
        config: ConfigFile,
        overrides: SessionOverrides,
        notifier: Notifier<TerminalBell>,
        worker: WorkerHandle,
    ) -> Self {
        let effective = overrides.apply(&config.settings);
        let mut app = Self {
            config_store,
            registry: Registry::from_items(config.beatmaps),
            schedule: PollSchedule::new(effective.check_interval()),
            settings: config.settings,
            overrides,
            notifier,
            history: Vec::new(),
            history_filter: HistoryFilter::default(),
            worker,
            monitoring: false,
            view: View::default(),
            input: None,
            selected_index: 0,
            history_scroll: 0,
            browse: BrowseState::default(),
            pending_lookups: HashSet::new(),
            status: StatusMessage {
                text: "Press s to start tracking, a to add a beatmapset".to_string(),
                level: StatusLevel::Info,
            },
            last_check: None,
            config_needs_reload: Arc::new(Mutex::new(false)),
            should_quit: false,
            animation_tick: 0,
            last_animation_update: Instant::now(),
        };
        app.notifier.sink_mut().enabled = effective.sound_enabled;
        app.refresh_history();
        app
    }

    /// Settings with the command-line overrides applied
    pub fn effective_settings(&self) -> Settings {
        self.overrides.apply(&self.settings)
    }

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = StatusMessage {
            text: text.into(),
            level,
        };
    }

    pub fn selected_item(&self) -> Option<&TrackedItem> {
        self.registry.list().get(self.selected_index)
    }

    pub fn history_offset(&self) -> chrono::FixedOffset {
        display_offset(self.settings.auto_utc, self.settings.utc_offset_hours)
    }

    // ------------------------------------------------------------------
    // Main loop hooks
    // ------------------------------------------------------------------

    /// Called once per event-loop iteration
    pub fn tick(&mut self, now: Instant) {
        while let Some(event) = self.worker.try_recv() {
            self.handle_worker_event(event);
        }

        self.reload_config_if_needed();

        if self.monitoring && self.schedule.is_due(now) {
            self.start_poll(now);
        }

        if now.saturating_duration_since(self.last_animation_update) >= ANIMATION_INTERVAL {
            self.animation_tick = self.animation_tick.wrapping_add(1);
            self.last_animation_update = now;
        }
    }

    fn start_poll(&mut self, now: Instant) {
        let ids = self.registry.enabled_ids();
        if ids.is_empty() {
            self.stop_monitoring();
            self.set_status(
                StatusLevel::Warning,
                "No beatmapsets have tracking enabled. Tracking stopped.",
            );
            return;
        }

        if self.worker.send(WorkerCommand::Poll(ids)) {
            self.schedule.mark_started(now);
        } else {
            self.stop_monitoring();
            self.set_status(StatusLevel::Error, "Network worker stopped unexpectedly");
        }
    }

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::PollFinished(outcomes) => self.on_poll_finished(outcomes),
            WorkerEvent::LookupFinished { id, result } => self.on_lookup_finished(id, result),
            WorkerEvent::SearchFinished { query, result } => {
                self.on_search_finished(query, result)
            }
        }
    }

    fn on_poll_finished(&mut self, outcomes: Vec<PollOutcome>) {
        self.schedule.mark_finished();

        let now = Utc::now();
        let report = apply_outcomes(&mut self.registry, outcomes, now);
        self.last_check = Some(now);

        let mut dirty = report.has_changes();
        let mut last_alert = None;

        for transition in &report.transitions {
            let entry = self.notifier.notify(transition, now);
            last_alert = Some(format!(
                "{} is now {}! {}",
                entry.title,
                entry.new_status.label(),
                entry.new_status.message()
            ));
        }

        let mut stopped = Vec::new();
        if self.settings.auto_stop_monitoring {
            stopped = apply_auto_stop(&mut self.registry, &report.transitions);
            dirty |= !stopped.is_empty();
        }

        if report.has_changes() {
            self.refresh_history();
        }

        if let Some(err) = report.auth_failure() {
            self.stop_monitoring();
            self.set_status(
                StatusLevel::Error,
                format!("{err}. Tracking stopped, fix the credentials in config.json"),
            );
        } else if let Some(alert) = last_alert {
            let suffix = if stopped.is_empty() {
                String::new()
            } else {
                " Tracking disabled.".to_string()
            };
            self.set_status(StatusLevel::Success, format!("{alert}{suffix}"));

            if self.settings.auto_stop_monitoring && self.registry.enabled_count() == 0 {
                self.stop_monitoring();
                self.set_status(
                    StatusLevel::Success,
                    "All tracked beatmapsets reached a final status. Tracking stopped.",
                );
            }
        } else if let Some((id, err)) = report.failures.first() {
            let failed = report.failures.len();
            self.set_status(
                StatusLevel::Warning,
                format!("{failed} check(s) failed, beatmapset {id}: {err}"),
            );
        } else if self.monitoring {
            let offset = self.history_offset();
            self.set_status(
                StatusLevel::Info,
                format!("Checked at {}", now.with_timezone(&offset).format("%H:%M:%S")),
            );
        }

        if dirty {
            self.save_config();
        }
    }

    fn on_lookup_finished(&mut self, id: u64, result: Result<BeatmapInfo, ApiError>) {
        self.pending_lookups.remove(&id);

        match result {
            Ok(info) => self.track(info),
            Err(err) => {
                warn!(id, error = %err, "Lookup failed");
                self.set_status(StatusLevel::Error, format!("Could not add {id}: {err}"));
            }
        }
    }

    fn on_search_finished(&mut self, query: SearchQuery, result: Result<SearchPage, ApiError>) {
        // Results for a query the user has since replaced
        if query.with_cursor(None) != self.browse.query.with_cursor(None) {
            return;
        }
        self.browse.loading = false;

        match result {
            Ok(page) => {
                if query.cursor.is_some() {
                    self.browse.results.extend(page.sets);
                } else {
                    self.browse.results = page.sets;
                    self.browse.selected = 0;
                }
                self.browse.next_cursor = page.cursor;
                self.set_status(
                    StatusLevel::Info,
                    format!("{} result(s)", self.browse.results.len()),
                );
            }
            Err(err) => {
                self.set_status(StatusLevel::Error, format!("Search failed: {err}"));
            }
        }
    }

    // ------------------------------------------------------------------
    // Registry actions
    // ------------------------------------------------------------------

    /// Start tracking a beatmapset whose metadata is already known
    fn track(&mut self, info: BeatmapInfo) {
        let title = info.display_title();
        let status = info.status;
        match self.registry.insert(TrackedItem::from_info(info, Utc::now())) {
            Ok(item) => {
                info!(id = item.id, "Added beatmapset");
                self.set_status(
                    StatusLevel::Success,
                    format!("Added {title} ({})", status.label()),
                );
                self.save_config();
            }
            Err(err) => self.set_status(StatusLevel::Warning, err.to_string()),
        }
    }

    /// Parse user input and request a lookup
    pub fn request_add(&mut self, input: &str) {
        match parse_beatmapset_id(input) {
            Some(id) => self.request_add_id(id),
            None => self.set_status(
                StatusLevel::Error,
                format!("Not a beatmapset id or URL: {}", input.trim()),
            ),
        }
    }

    pub fn request_add_id(&mut self, id: u64) {
        if self.registry.contains(id) {
            self.set_status(
                StatusLevel::Warning,
                RegistryError::AlreadyTracked(id).to_string(),
            );
            return;
        }
        if !self.pending_lookups.insert(id) {
            self.set_status(StatusLevel::Info, format!("Already looking up {id}..."));
            return;
        }
        if !self.worker.send(WorkerCommand::Lookup(id)) {
            self.pending_lookups.remove(&id);
            self.set_status(StatusLevel::Error, "Network worker stopped unexpectedly");
            return;
        }
        self.set_status(StatusLevel::Info, format!("Looking up {id}..."));
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };
        if let Ok(item) = self.registry.remove(id) {
            self.set_status(
                StatusLevel::Info,
                format!("Removed {}", item.display_title()),
            );
            self.clamp_selection();
            self.save_config();
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };
        if let Ok(enabled) = self.registry.toggle(id) {
            let state = if enabled { "enabled" } else { "disabled" };
            self.set_status(StatusLevel::Info, format!("Tracking {state} for {id}"));
            self.save_config();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.registry.len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    // ------------------------------------------------------------------
    // Monitoring
    // ------------------------------------------------------------------

    pub fn toggle_monitoring(&mut self) {
        if self.monitoring {
            self.stop_monitoring();
            self.set_status(StatusLevel::Info, "Tracking stopped");
            return;
        }

        if self.registry.is_empty() {
            self.set_status(StatusLevel::Warning, "Add at least one beatmapset first");
        } else if self.registry.enabled_count() == 0 {
            self.set_status(
                StatusLevel::Warning,
                "Enable tracking for at least one beatmapset (space)",
            );
        } else if !self.settings.has_credentials() {
            self.set_status(
                StatusLevel::Error,
                "No API credentials, set client_id and client_secret in config.json",
            );
        } else {
            self.monitoring = true;
            self.schedule.reset();
            self.set_status(StatusLevel::Info, "Tracking active...");
            info!(items = self.registry.enabled_count(), "Tracking started");
        }
    }

    fn stop_monitoring(&mut self) {
        if self.monitoring {
            info!("Tracking stopped");
        }
        self.monitoring = false;
    }

    /// Check now instead of waiting for the next interval
    pub fn refresh_now(&mut self, now: Instant) {
        if self.schedule.is_in_flight() {
            return;
        }
        if !self.settings.has_credentials() {
            self.set_status(
                StatusLevel::Error,
                "No API credentials, set client_id and client_secret in config.json",
            );
            return;
        }
        self.schedule.reset();
        self.start_poll(now);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn refresh_history(&mut self) {
        match self.notifier.store().entries() {
            Ok(entries) => self.history = entries,
            Err(err) => warn!(error = %err, "Could not read history"),
        }
        self.clamp_history_scroll();
    }

    /// History entries passing the current filter, newest first
    pub fn filtered_history(&self) -> Vec<&HistoryEntry> {
        self.history
            .iter()
            .filter(|entry| self.history_filter.matches(entry))
            .collect()
    }

    fn clamp_history_scroll(&mut self) {
        let len = self.filtered_history().len();
        if self.history_scroll >= len {
            self.history_scroll = len.saturating_sub(1);
        }
    }

    fn update_history_filter(&mut self, update: impl FnOnce(&mut HistoryFilter)) {
        update(&mut self.history_filter);
        self.history_scroll = 0;
        let shown = self.filtered_history().len();
        let text = if self.history_filter.is_active() {
            format!(
                "{shown} of {} entries match {}",
                self.history.len(),
                self.history_filter.describe()
            )
        } else {
            "History filter cleared".to_string()
        };
        self.set_status(StatusLevel::Info, text);
    }

    pub fn delete_selected_history(&mut self) {
        let Some(entry) = self
            .filtered_history()
            .get(self.history_scroll)
            .map(|entry| (*entry).clone())
        else {
            return;
        };
        match self.notifier.store_mut().delete(&entry) {
            Ok(_) => {
                self.refresh_history();
                self.set_status(StatusLevel::Info, format!("Deleted entry for {}", entry.title));
            }
            Err(err) => self.set_status(StatusLevel::Error, format!("Delete error: {err}")),
        }
    }

    pub fn export_history(&mut self) {
        let path = self.config_store.export_path();
        match self.notifier.store().export_json(&path) {
            Ok(count) => self.set_status(
                StatusLevel::Success,
                format!("Exported {count} entries to {}", path.display()),
            ),
            Err(err) => self.set_status(StatusLevel::Error, format!("Export error: {err}")),
        }
    }

    pub fn import_history(&mut self, path: &str) {
        let path = PathBuf::from(path.trim());
        match self.notifier.store_mut().import_json(&path) {
            Ok(added) => {
                self.refresh_history();
                self.set_status(StatusLevel::Success, format!("Imported {added} new entries"));
            }
            Err(err) => self.set_status(StatusLevel::Error, format!("Import error: {err}")),
        }
    }

    pub fn clear_history(&mut self) {
        match self.notifier.store_mut().clear() {
            Ok(removed) => {
                self.refresh_history();
                self.history_scroll = 0;
                self.set_status(StatusLevel::Info, format!("Cleared {removed} entries"));
            }
            Err(err) => self.set_status(StatusLevel::Error, format!("Clear error: {err}")),
        }
    }

    // ------------------------------------------------------------------
    // Browse
    // ------------------------------------------------------------------

    pub fn submit_search(&mut self, text: &str) {
        self.browse.query = SearchQuery {
            text: text.trim().to_string(),
            ..self.browse.query.with_cursor(None)
        };
        self.browse.loading = true;
        self.browse.next_cursor = None;
        if !self
            .worker
            .send(WorkerCommand::Search(self.browse.query.clone()))
        {
            self.browse.loading = false;
            self.set_status(StatusLevel::Error, "Network worker stopped unexpectedly");
            return;
        }
        self.set_status(StatusLevel::Info, "Searching...");
    }

    /// Change one search filter and search again with the same text
    fn update_browse_filter(&mut self, update: impl FnOnce(&mut SearchQuery)) {
        update(&mut self.browse.query);
        let text = self.browse.query.text.clone();
        self.submit_search(&text);
    }

    pub fn load_more(&mut self) {
        if self.browse.loading {
            return;
        }
        let Some(cursor) = self.browse.next_cursor.clone() else {
            self.set_status(StatusLevel::Info, "No more results");
            return;
        };
        self.browse.loading = true;
        if !self.worker.send(WorkerCommand::Search(
            self.browse.query.with_cursor(Some(cursor)),
        )) {
            self.browse.loading = false;
            self.set_status(StatusLevel::Error, "Network worker stopped unexpectedly");
        }
    }

    pub fn add_selected_browse(&mut self) {
        let Some(info) = self.browse.results.get(self.browse.selected).cloned() else {
            return;
        };
        if self.registry.contains(info.id) {
            self.set_status(
                StatusLevel::Warning,
                RegistryError::AlreadyTracked(info.id).to_string(),
            );
            return;
        }
        self.track(info);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn save_config(&mut self) {
        let config = ConfigFile {
            settings: self.settings.clone(),
            beatmaps: self.registry.to_vec(),
        };
        if let Err(err) = self.config_store.save(&config) {
            warn!(error = %err, "Failed to save config");
            self.set_status(StatusLevel::Error, format!("Could not save config: {err}"));
        }
    }

    /// Pick up settings edited outside the app. Tracked items stay as they
    /// are in memory.
    pub fn reload_config_if_needed(&mut self) {
        if !take_reload_flag(&self.config_needs_reload) {
            return;
        }

        let config = match self.config_store.load() {
            Ok(config) => config,
            Err(err) => {
                self.set_status(StatusLevel::Warning, format!("Config not reloaded: {err}"));
                return;
            }
        };

        if config.settings == self.settings {
            return;
        }

        info!("Settings changed on disk, reloading");
        self.apply_settings(config.settings);
        self.set_status(StatusLevel::Info, "Settings reloaded");
    }

    fn apply_settings(&mut self, settings: Settings) {
        if settings.credentials() != self.settings.credentials() {
            self.worker
                .send(WorkerCommand::SetCredentials(settings.credentials()));
        }
        if settings.history_limit != self.settings.history_limit {
            if let Err(err) = self.notifier.store_mut().set_limit(settings.history_limit) {
                warn!(error = %err, "Could not apply history limit");
            }
            self.refresh_history();
        }
        self.settings = settings;

        let effective = self.effective_settings();
        self.schedule.set_interval(effective.check_interval());
        self.notifier.sink_mut().enabled = effective.sound_enabled;
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn open_input(&mut self, kind: InputKind) {
        let buffer = match kind {
            InputKind::Search => self.browse.query.text.clone(),
            InputKind::ImportPath => self.config_store.export_path().display().to_string(),
            InputKind::HistoryFilter => self.history_filter.text.clone(),
            InputKind::AddBeatmap => String::new(),
        };
        self.input = Some(InputPrompt { kind, buffer });
    }

    fn submit_input(&mut self) {
        let Some(prompt) = self.input.take() else {
            return;
        };
        let may_be_empty = matches!(prompt.kind, InputKind::Search | InputKind::HistoryFilter);
        if prompt.buffer.trim().is_empty() && !may_be_empty {
            return;
        }
        match prompt.kind {
            InputKind::AddBeatmap => self.request_add(&prompt.buffer),
            InputKind::Search => {
                self.view = View::Browse;
                self.submit_search(&prompt.buffer);
            }
            InputKind::ImportPath => self.import_history(&prompt.buffer),
            InputKind::HistoryFilter => {
                let text = prompt.buffer.trim().to_string();
                self.update_history_filter(|filter| filter.text = text);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if let Some(prompt) = self.input.as_mut() {
            match key.code {
                KeyCode::Esc => self.input = None,
                KeyCode::Enter => self.submit_input(),
                KeyCode::Backspace => {
                    prompt.buffer.pop();
                }
                KeyCode::Char(c) => prompt.buffer.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Char('s') => self.toggle_monitoring(),
            KeyCode::Char('r') => self.refresh_now(Instant::now()),
            KeyCode::Char('a') => self.open_input(InputKind::AddBeatmap),
            KeyCode::Char('/') if self.view == View::History => {
                self.open_input(InputKind::HistoryFilter)
            }
            KeyCode::Char('/') => self.open_input(InputKind::Search),
            KeyCode::Char('x') => self.export_history(),
            KeyCode::Char('i') => self.open_input(InputKind::ImportPath),
            KeyCode::Char('C') => self.clear_history(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            _ => self.handle_view_key(key.code),
        }
    }

    fn handle_view_key(&mut self, code: KeyCode) {
        match (self.view, code) {
            (View::Tracked, KeyCode::Char(' ')) => self.toggle_selected(),
            (View::Tracked, KeyCode::Char('d') | KeyCode::Delete) => self.remove_selected(),
            (View::History, KeyCode::Char('f')) => {
                self.update_history_filter(HistoryFilter::cycle_status)
            }
            (View::History, KeyCode::Char('m')) => {
                self.update_history_filter(HistoryFilter::cycle_mode)
            }
            (View::History, KeyCode::Char('d') | KeyCode::Delete) => {
                self.delete_selected_history()
            }
            (View::Browse, KeyCode::Enter) => self.add_selected_browse(),
            (View::Browse, KeyCode::Char('n')) => self.load_more(),
            (View::Browse, KeyCode::Char('f')) => {
                self.update_browse_filter(SearchQuery::cycle_status)
            }
            (View::Browse, KeyCode::Char('m')) => {
                self.update_browse_filter(SearchQuery::cycle_mode)
            }
            (View::Browse, KeyCode::Char('o')) => {
                self.update_browse_filter(SearchQuery::cycle_sort)
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let (current, len) = match self.view {
            View::Tracked => (self.selected_index, self.registry.len()),
            View::History => (self.history_scroll, self.filtered_history().len()),
            View::Browse => (self.browse.selected, self.browse.results.len()),
        };
        if len == 0 {
            return;
        }
        let next = current.saturating_add_signed(delta).min(len - 1);
        match self.view {
            View::Tracked => self.selected_index = next,
            View::History => self.history_scroll = next,
            View::Browse => self.browse.selected = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::info;
    use crate::models::{GameMode, RankStatus};
    use crate::store::HistoryStore;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

    struct Harness {
        app: App,
        commands: UnboundedReceiver<WorkerCommand>,
        events: UnboundedSender<WorkerEvent>,
        _dir: TempDir,
    }

    fn harness(items: &[(u64, RankStatus)], settings: Settings) -> Harness {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let now = Utc::now();
        let config = ConfigFile {
            settings,
            beatmaps: items
                .iter()
                .map(|&(id, status)| TrackedItem::from_info(info(id, status), now))
                .collect(),
        };
        let notifier = Notifier::new(
            HistoryStore::open_in_memory(100).unwrap(),
            TerminalBell::new(false),
        );
        let (worker, commands, events) = WorkerHandle::detached();
        let overrides = SessionOverrides {
            sound_enabled: Some(false),
            ..SessionOverrides::default()
        };
        let app = App::new(store, config, overrides, notifier, worker);
        Harness {
            app,
            commands,
            events,
            _dir: dir,
        }
    }

    fn with_credentials() -> Settings {
        Settings {
            client_id: "1".to_string(),
            client_secret: "secret".to_string(),
            ..Settings::default()
        }
    }

    fn poll_finished(outcomes: Vec<(u64, Result<RankStatus, ApiError>)>) -> WorkerEvent {
        WorkerEvent::PollFinished(
            outcomes
                .into_iter()
                .map(|(id, result)| PollOutcome {
                    id,
                    result: result.map(|status| info(id, status)),
                })
                .collect(),
        )
    }

    #[test]
    fn test_status_change_records_history() {
        let mut h = harness(&[(1, RankStatus::Qualified)], with_credentials());

        h.app
            .handle_worker_event(poll_finished(vec![(1, Ok(RankStatus::Ranked))]));

        assert_eq!(h.app.registry.get(1).unwrap().status, RankStatus::Ranked);
        assert_eq!(h.app.history.len(), 1);
        assert_eq!(h.app.history[0].old_status, RankStatus::Qualified);
        assert_eq!(h.app.history[0].new_status, RankStatus::Ranked);
        assert_eq!(h.app.status.level, StatusLevel::Success);

        let saved = h.app.config_store.load().unwrap();
        assert_eq!(saved.beatmaps[0].status, RankStatus::Ranked);
    }

    #[test]
    fn test_failed_poll_keeps_status_and_history() {
        let mut h = harness(&[(1, RankStatus::Pending)], with_credentials());

        h.app.handle_worker_event(poll_finished(vec![(
            1,
            Err(ApiError::Status(500, "Internal Server Error".to_string())),
        )]));

        assert_eq!(h.app.registry.get(1).unwrap().status, RankStatus::Pending);
        assert!(h.app.history.is_empty());
        assert_eq!(h.app.status.level, StatusLevel::Warning);
    }

    #[test]
    fn test_start_requires_credentials() {
        let mut h = harness(&[(1, RankStatus::Pending)], Settings::default());
        h.app.toggle_monitoring();
        assert!(!h.app.monitoring);
        assert_eq!(h.app.status.level, StatusLevel::Error);
    }

    #[test]
    fn test_start_requires_enabled_item() {
        let mut h = harness(&[(1, RankStatus::Pending)], with_credentials());
        h.app.registry.set_enabled(1, false).unwrap();
        h.app.toggle_monitoring();
        assert!(!h.app.monitoring);
    }

    #[test]
    fn test_tick_dispatches_enabled_ids_once_per_interval() {
        let mut h = harness(
            &[(1, RankStatus::Pending), (2, RankStatus::Pending)],
            with_credentials(),
        );
        h.app.registry.set_enabled(2, false).unwrap();
        h.app.toggle_monitoring();
        assert!(h.app.monitoring);

        let start = Instant::now();
        h.app.tick(start);
        match h.commands.try_recv().unwrap() {
            WorkerCommand::Poll(ids) => assert_eq!(ids, vec![1]),
            other => panic!("unexpected command: {other:?}"),
        }

        // In flight: nothing new even after the interval
        h.app.tick(start + Duration::from_secs(5));
        assert!(h.commands.try_recv().is_err());

        h.events
            .send(poll_finished(vec![(1, Ok(RankStatus::Pending))]))
            .unwrap();
        h.app.tick(start + Duration::from_millis(100));
        assert!(h.commands.try_recv().is_err());

        h.app.tick(start + Duration::from_secs(2));
        assert!(matches!(
            h.commands.try_recv().unwrap(),
            WorkerCommand::Poll(_)
        ));
    }

    #[test]
    fn test_auth_failure_stops_monitoring() {
        let mut h = harness(&[(1, RankStatus::Pending)], with_credentials());
        h.app.toggle_monitoring();

        h.app.handle_worker_event(poll_finished(vec![(
            1,
            Err(ApiError::Auth("bad secret".to_string())),
        )]));

        assert!(!h.app.monitoring);
        assert_eq!(h.app.status.level, StatusLevel::Error);
    }

    #[test]
    fn test_auto_stop_disables_and_stops_when_all_settled() {
        let settings = Settings {
            auto_stop_monitoring: true,
            ..with_credentials()
        };
        let mut h = harness(&[(1, RankStatus::Qualified)], settings);
        h.app.toggle_monitoring();

        h.app
            .handle_worker_event(poll_finished(vec![(1, Ok(RankStatus::Ranked))]));

        assert!(!h.app.registry.get(1).unwrap().enabled);
        assert!(!h.app.monitoring);
        assert_eq!(h.app.history.len(), 1);
    }

    #[test]
    fn test_request_add_sends_lookup_once() {
        let mut h = harness(&[], with_credentials());

        h.app.request_add("https://osu.ppy.sh/beatmapsets/777#osu/1");
        h.app.request_add("777");

        assert!(matches!(
            h.commands.try_recv().unwrap(),
            WorkerCommand::Lookup(777)
        ));
        assert!(h.commands.try_recv().is_err());
    }

    #[test]
    fn test_request_add_duplicate_skips_lookup() {
        let mut h = harness(&[(5, RankStatus::Pending)], with_credentials());
        h.app.request_add("5");
        assert!(h.commands.try_recv().is_err());
        assert_eq!(h.app.status.level, StatusLevel::Warning);
    }

    #[test]
    fn test_request_add_rejects_garbage() {
        let mut h = harness(&[], with_credentials());
        h.app.request_add("hello");
        assert!(h.commands.try_recv().is_err());
        assert_eq!(h.app.status.level, StatusLevel::Error);
    }

    #[test]
    fn test_lookup_not_left_pending_when_worker_is_gone() {
        let Harness {
            mut app,
            commands,
            _dir,
            ..
        } = harness(&[], with_credentials());
        drop(commands);

        app.request_add("42");

        assert!(app.pending_lookups.is_empty());
        assert_eq!(app.status.level, StatusLevel::Error);

        app.request_add("42");
        assert!(!app.status.text.contains("Already looking up"));
    }

    #[test]
    fn test_lookup_finished_adds_and_saves() {
        let mut h = harness(&[], with_credentials());
        h.app.request_add("42");

        h.app.handle_worker_event(WorkerEvent::LookupFinished {
            id: 42,
            result: Ok(info(42, RankStatus::Qualified)),
        });

        assert!(h.app.registry.contains(42));
        assert!(h.app.pending_lookups.is_empty());
        assert_eq!(h.app.config_store.load().unwrap().beatmaps.len(), 1);
    }

    #[test]
    fn test_lookup_not_found_is_surfaced() {
        let mut h = harness(&[], with_credentials());
        h.app.request_add("42");
        h.app.handle_worker_event(WorkerEvent::LookupFinished {
            id: 42,
            result: Err(ApiError::NotFound(42)),
        });
        assert!(h.app.registry.is_empty());
        assert_eq!(h.app.status.level, StatusLevel::Error);
        assert!(h.app.status.text.contains("not found"));
    }

    #[test]
    fn test_remove_and_toggle_selected() {
        let mut h = harness(
            &[(1, RankStatus::Pending), (2, RankStatus::Pending)],
            with_credentials(),
        );
        h.app.selected_index = 1;
        h.app.toggle_selected();
        assert!(!h.app.registry.get(2).unwrap().enabled);

        h.app.remove_selected();
        assert!(!h.app.registry.contains(2));
        assert_eq!(h.app.selected_index, 0);
    }

    #[test]
    fn test_search_results_replace_then_append() {
        let mut h = harness(&[], with_credentials());
        h.app.submit_search("camellia");
        let query = match h.commands.try_recv().unwrap() {
            WorkerCommand::Search(query) => query,
            other => panic!("unexpected command: {other:?}"),
        };

        h.app.handle_worker_event(WorkerEvent::SearchFinished {
            query: query.clone(),
            result: Ok(SearchPage {
                sets: vec![info(1, RankStatus::Qualified)],
                cursor: Some("next".to_string()),
            }),
        });
        assert_eq!(h.app.browse.results.len(), 1);

        h.app.load_more();
        let next = match h.commands.try_recv().unwrap() {
            WorkerCommand::Search(query) => query,
            other => panic!("unexpected command: {other:?}"),
        };
        assert_eq!(next.cursor.as_deref(), Some("next"));

        h.app.handle_worker_event(WorkerEvent::SearchFinished {
            query: next,
            result: Ok(SearchPage {
                sets: vec![info(2, RankStatus::Qualified)],
                cursor: None,
            }),
        });
        assert_eq!(h.app.browse.results.len(), 2);
        assert!(h.app.browse.next_cursor.is_none());

        h.app.browse.selected = 1;
        h.app.add_selected_browse();
        assert!(h.app.registry.contains(2));
    }

    #[test]
    fn test_stale_search_results_are_ignored() {
        let mut h = harness(&[], with_credentials());
        h.app.submit_search("first");
        h.app.submit_search("second");

        let stale = SearchQuery {
            text: "first".to_string(),
            ..SearchQuery::default()
        };
        h.app.handle_worker_event(WorkerEvent::SearchFinished {
            query: stale,
            result: Ok(SearchPage {
                sets: vec![info(1, RankStatus::Qualified)],
                cursor: None,
            }),
        });
        assert!(h.app.browse.results.is_empty());
        assert!(h.app.browse.loading);
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn next_search(commands: &mut UnboundedReceiver<WorkerCommand>) -> SearchQuery {
        match commands.try_recv().unwrap() {
            WorkerCommand::Search(query) => query,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_browse_filter_keys_search_again() {
        let mut h = harness(&[], with_credentials());
        h.app.view = View::Browse;
        h.app.submit_search("camellia");
        next_search(&mut h.commands);

        press(&mut h.app, KeyCode::Char('f'));
        let query = next_search(&mut h.commands);
        assert_eq!(query.text, "camellia");
        assert_eq!(query.status, Some(RankStatus::Ranked));
        assert!(query.cursor.is_none());

        press(&mut h.app, KeyCode::Char('m'));
        press(&mut h.app, KeyCode::Char('m'));
        press(&mut h.app, KeyCode::Char('o'));
        next_search(&mut h.commands);
        next_search(&mut h.commands);
        let query = next_search(&mut h.commands);
        assert_eq!(query.status, Some(RankStatus::Ranked));
        assert_eq!(query.mode, Some(GameMode::Taiko));
        assert_eq!(query.sort.as_deref(), Some("ranked_desc"));
        assert!(query.to_params().contains(&("m", "1".to_string())));

        // A page for the previous filters is dropped
        let mut stale = query.clone();
        stale.sort = None;
        h.app.handle_worker_event(WorkerEvent::SearchFinished {
            query: stale,
            result: Ok(SearchPage {
                sets: vec![info(1, RankStatus::Ranked)],
                cursor: None,
            }),
        });
        assert!(h.app.browse.results.is_empty());
    }

    #[test]
    fn test_history_filter_keys() {
        let mut h = harness(
            &[(1, RankStatus::Qualified), (2, RankStatus::Pending)],
            with_credentials(),
        );
        h.app.handle_worker_event(poll_finished(vec![
            (1, Ok(RankStatus::Ranked)),
            (2, Ok(RankStatus::Loved)),
        ]));
        assert_eq!(h.app.history.len(), 2);
        h.app.view = View::History;

        // Graveyard, WIP, Pending
        for _ in 0..3 {
            press(&mut h.app, KeyCode::Char('f'));
        }
        let ids: Vec<u64> = h.app.filtered_history().iter().map(|e| e.beatmapset_id).collect();
        assert_eq!(ids, vec![2]);

        press(&mut h.app, KeyCode::Char('m'));
        assert_eq!(h.app.filtered_history().len(), 1);
        press(&mut h.app, KeyCode::Char('m'));
        assert!(h.app.filtered_history().is_empty());

        h.app.history_filter = HistoryFilter::default();
        press(&mut h.app, KeyCode::Char('/'));
        assert_eq!(
            h.app.input.as_ref().map(|prompt| prompt.kind),
            Some(InputKind::HistoryFilter)
        );
        for c in "osu.ppy.sh/beatmapsets/1".chars() {
            press(&mut h.app, KeyCode::Char(c));
        }
        press(&mut h.app, KeyCode::Enter);
        let ids: Vec<u64> = h.app.filtered_history().iter().map(|e| e.beatmapset_id).collect();
        assert_eq!(ids, vec![1]);
        assert!(h.commands.try_recv().is_err());
    }

    #[test]
    fn test_delete_selected_history_entry() {
        let mut h = harness(
            &[(1, RankStatus::Qualified), (2, RankStatus::Pending)],
            with_credentials(),
        );
        h.app.handle_worker_event(poll_finished(vec![
            (1, Ok(RankStatus::Ranked)),
            (2, Ok(RankStatus::Loved)),
        ]));
        h.app.view = View::History;
        h.app.history_filter.text = "title 2".to_string();

        press(&mut h.app, KeyCode::Char('d'));

        let remaining: Vec<u64> = h.app.history.iter().map(|e| e.beatmapset_id).collect();
        assert_eq!(remaining, vec![1]);
        assert_eq!(h.app.notifier.store().entries().unwrap().len(), 1);
        assert!(h.app.filtered_history().is_empty());
        assert_eq!(h.app.history_scroll, 0);
        assert!(h.app.registry.contains(2));
    }

    #[test]
    fn test_export_import_and_clear_history() {
        let mut h = harness(&[(1, RankStatus::Pending)], with_credentials());
        h.app
            .handle_worker_event(poll_finished(vec![(1, Ok(RankStatus::Qualified))]));
        h.app.export_history();
        let export = h.app.config_store.export_path();
        assert!(export.exists());

        h.app.clear_history();
        assert!(h.app.history.is_empty());

        h.app.import_history(&export.display().to_string());
        assert_eq!(h.app.history.len(), 1);
    }

    #[test]
    fn test_reload_applies_new_credentials() {
        let mut h = harness(&[(1, RankStatus::Pending)], Settings::default());
        h.app
            .config_store
            .save(&ConfigFile {
                settings: with_credentials(),
                beatmaps: Vec::new(),
            })
            .unwrap();
        *h.app.config_needs_reload.lock().unwrap() = true;

        h.app.tick(Instant::now());

        assert!(h.app.settings.has_credentials());
        assert!(h.app.registry.contains(1));
        assert!(matches!(
            h.commands.try_recv().unwrap(),
            WorkerCommand::SetCredentials(_)
        ));
    }

    #[test]
    fn test_input_prompt_typing() {
        let mut h = harness(&[], with_credentials());
        h.app.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        assert!(h.app.input.is_some());
        for c in "123".chars() {
            h.app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        h.app.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        h.app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(h.app.input.is_none());
        assert!(matches!(
            h.commands.try_recv().unwrap(),
            WorkerCommand::Lookup(12)
        ));
    }
}
