//! Turns detected transitions into history entries and alerts.

use std::io::{self, Write};

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use crate::models::HistoryEntry;
use crate::poller::Transition;
use crate::store::HistoryStore;
use crate::utils::format_timestamp;

/// Fire-and-forget alert for one transition
pub trait AlertSink {
    fn alert(&mut self, transition: &Transition);
}

/// Rings the terminal bell
#[derive(Debug, Clone)]
pub struct TerminalBell {
    pub enabled: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl AlertSink for TerminalBell {
    fn alert(&mut self, _transition: &Transition) {
        if !self.enabled {
            return;
        }
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Prints one line per transition, for runs without the TUI
#[derive(Debug, Clone)]
pub struct ConsoleAlert {
    pub bell: bool,
    offset: FixedOffset,
}

impl ConsoleAlert {
    pub fn new(bell: bool, offset: FixedOffset) -> Self {
        Self { bell, offset }
    }

    pub fn line(&self, transition: &Transition, now: DateTime<Utc>) -> String {
        format!(
            "[{}] #{} {}: {} -> {}",
            format_timestamp(now, self.offset),
            transition.item.id,
            transition.item.display_title(),
            transition.old.label(),
            transition.new.label()
        )
    }
}

impl AlertSink for ConsoleAlert {
    fn alert(&mut self, transition: &Transition) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{}", self.line(transition, Utc::now()));
        if self.bell {
            let _ = stdout.write_all(b"\x07");
        }
        let _ = stdout.flush();
    }
}

pub fn history_entry(transition: &Transition, now: DateTime<Utc>) -> HistoryEntry {
    HistoryEntry {
        timestamp: now,
        beatmapset_id: transition.item.id,
        title: transition.item.display_title(),
        creator: transition.item.creator.clone(),
        old_status: transition.old,
        new_status: transition.new,
        ranked_date: transition.item.ranked_date.clone(),
        mode: transition.item.mode,
    }
}

/// Owns the history log and the alert sink
pub struct Notifier<A: AlertSink> {
    store: HistoryStore,
    sink: A,
}

impl<A: AlertSink> Notifier<A> {
    pub fn new(store: HistoryStore, sink: A) -> Self {
        Self { store, sink }
    }

    /// Record the transition and alert. A failed history write is logged and
    /// does not suppress the alert.
    pub fn notify(&mut self, transition: &Transition, now: DateTime<Utc>) -> HistoryEntry {
        let entry = history_entry(transition, now);
        debug!(id = entry.beatmapset_id, change = %entry.summary(), "Recording history entry");
        if let Err(err) = self.store.append(&entry) {
            warn!(id = entry.beatmapset_id, error = %err, "Failed to record history entry");
        }
        self.sink.alert(transition);
        entry
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut HistoryStore {
        &mut self.store
    }

    #[cfg(test)]
    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::info;
    use crate::models::{RankStatus, TrackedItem};

    #[derive(Default)]
    struct RecordingSink {
        alerts: Vec<(u64, RankStatus, RankStatus)>,
    }

    impl AlertSink for RecordingSink {
        fn alert(&mut self, transition: &Transition) {
            self.alerts
                .push((transition.item.id, transition.old, transition.new));
        }
    }

    fn transition(id: u64, old: RankStatus, new: RankStatus) -> Transition {
        Transition {
            item: TrackedItem::from_info(info(id, new), Utc::now()),
            old,
            new,
        }
    }

    #[test]
    fn test_notify_appends_and_alerts() {
        let store = HistoryStore::open_in_memory(10).unwrap();
        let mut notifier = Notifier::new(store, RecordingSink::default());
        let now = Utc::now();

        let entry = notifier.notify(
            &transition(3, RankStatus::Qualified, RankStatus::Ranked),
            now,
        );

        assert_eq!(entry.old_status, RankStatus::Qualified);
        assert_eq!(entry.new_status, RankStatus::Ranked);
        assert_eq!(entry.title, "Artist 3 - Title 3");
        assert_eq!(notifier.store().len().unwrap(), 1);
        assert_eq!(
            notifier.sink().alerts,
            vec![(3, RankStatus::Qualified, RankStatus::Ranked)]
        );
    }

    #[test]
    fn test_one_entry_per_transition() {
        let store = HistoryStore::open_in_memory(10).unwrap();
        let mut notifier = Notifier::new(store, RecordingSink::default());
        let now = Utc::now();

        notifier.notify(&transition(1, RankStatus::Pending, RankStatus::Qualified), now);
        notifier.notify(&transition(2, RankStatus::Pending, RankStatus::Loved), now);

        assert_eq!(notifier.store().len().unwrap(), 2);
        assert_eq!(notifier.sink().alerts.len(), 2);
    }

    #[test]
    fn test_console_line() {
        use chrono::TimeZone;

        let console = ConsoleAlert::new(false, FixedOffset::east_opt(0).unwrap());
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap();
        let line = console.line(&transition(7, RankStatus::Qualified, RankStatus::Ranked), now);
        assert_eq!(
            line,
            "[2026-03-01 12:00:05] #7 Artist 7 - Title 7: Qualified -> Ranked"
        );
    }

    #[test]
    fn test_silent_bell_does_nothing() {
        let mut bell = TerminalBell::new(false);
        bell.alert(&transition(1, RankStatus::Pending, RankStatus::Ranked));
        assert!(!bell.enabled);
    }
}
