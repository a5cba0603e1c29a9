//! Status polling and diffing.
//!
//! A poll cycle runs in two halves. [`poll_once`] does the network part
//! against a [`BeatmapSource`] and can run off the UI thread.
//! [`apply_outcomes`] runs where the registry lives and turns the responses
//! into [`Transition`]s.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{ApiError, BeatmapSource};
use crate::models::{RankStatus, TrackedItem};
use crate::registry::Registry;

/// Response for one id in a poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub id: u64,
    pub result: Result<crate::models::BeatmapInfo, ApiError>,
}

/// A detected status change
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Item state after the update
    pub item: TrackedItem,
    pub old: RankStatus,
    pub new: RankStatus,
}

/// What one applied cycle did
#[derive(Debug, Default)]
pub struct PollReport {
    /// Successful fetches that were applied
    pub checked: usize,
    pub transitions: Vec<Transition>,
    pub failures: Vec<(u64, ApiError)>,
}

impl PollReport {
    pub fn has_changes(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// Auth errors block polling until the credentials are fixed
    pub fn auth_failure(&self) -> Option<&ApiError> {
        self.failures
            .iter()
            .map(|(_, err)| err)
            .find(|err| err.is_auth())
    }
}

/// Fetch every id in order.
///
/// Stops early on an auth error: every following request would fail the
/// same way and each one would retry the token exchange.
pub async fn poll_once<S: BeatmapSource>(source: &S, ids: &[u64]) -> Vec<PollOutcome> {
    let mut outcomes = Vec::with_capacity(ids.len());

    for &id in ids {
        let result = source.fetch_beatmapset(id).await;
        let stop = matches!(&result, Err(err) if err.is_auth());
        outcomes.push(PollOutcome { id, result });
        if stop {
            warn!(id, "Authentication failed, aborting poll cycle");
            break;
        }
    }

    outcomes
}

/// Apply fetched statuses to the registry.
///
/// Successful fetches refresh the item. A transition is emitted only when the
/// fetched status differs from the stored one. Failures leave the item
/// untouched. Outcomes for ids removed since the cycle started are dropped.
pub fn apply_outcomes(
    registry: &mut Registry,
    outcomes: Vec<PollOutcome>,
    now: DateTime<Utc>,
) -> PollReport {
    let mut report = PollReport::default();

    for outcome in outcomes {
        let id = outcome.id;
        match outcome.result {
            Ok(info) => {
                let Some(item) = registry.get_mut(id) else {
                    debug!(id, "Dropping poll result for untracked beatmapset");
                    continue;
                };

                let old = item.refresh_from(info, now);
                report.checked += 1;

                if old != item.status {
                    info!(
                        id,
                        title = %item.display_title(),
                        old = %old,
                        new = %item.status,
                        "Status changed"
                    );
                    report.transitions.push(Transition {
                        item: item.clone(),
                        old,
                        new: item.status,
                    });
                }
            }
            Err(err) => {
                warn!(id, error = %err, "Poll failed");
                report.failures.push((id, err));
            }
        }
    }

    debug!(
        checked = report.checked,
        changed = report.transitions.len(),
        failed = report.failures.len(),
        "Applied poll results"
    );
    report
}

/// Disable tracking for items whose transition reached a final status.
/// Returns the ids that were switched off.
pub fn apply_auto_stop(registry: &mut Registry, transitions: &[Transition]) -> Vec<u64> {
    let mut stopped = Vec::new();

    for transition in transitions.iter().filter(|t| t.new.is_final()) {
        if let Some(item) = registry.get_mut(transition.item.id) {
            if item.enabled {
                item.enabled = false;
                stopped.push(item.id);
            }
        }
    }

    if !stopped.is_empty() {
        info!(?stopped, "Auto-stopped tracking for settled beatmapsets");
    }

    stopped
}

/// Fixed-interval timer for poll cycles.
///
/// A new cycle is never due while the previous one is still in flight.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    last_started: Option<Instant>,
    in_flight: bool,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_started: None,
            in_flight: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        match self.last_started {
            Some(started) => now.saturating_duration_since(started) >= self.interval,
            None => true,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn mark_started(&mut self, now: Instant) {
        self.last_started = Some(now);
        self.in_flight = true;
    }

    pub fn mark_finished(&mut self) {
        self.in_flight = false;
    }

    /// Make the next check due immediately
    pub fn reset(&mut self) {
        self.last_started = None;
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        if self.in_flight {
            return None;
        }
        let started = self.last_started?;
        Some(self.interval.saturating_sub(now.saturating_duration_since(started)))
    }
}
