//! Polling without the TUI.
//!
//! Adds any beatmapsets given on the command line, then checks the enabled
//! ones on a fixed interval until interrupted, printing each status change.

use std::future::Future;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::api::BeatmapSource;
use crate::config::{ConfigFile, ConfigStore, Settings};
use crate::error::{Error, Result};
use crate::notifier::{AlertSink, Notifier};
use crate::poller::{apply_auto_stop, apply_outcomes, poll_once, PollReport};
use crate::registry::{add_tracked, Registry};

/// Result of one headless cycle
#[derive(Debug)]
pub struct CycleSummary {
    pub report: PollReport,
    pub stopped: Vec<u64>,
}

impl CycleSummary {
    fn is_dirty(&self) -> bool {
        self.report.has_changes() || !self.stopped.is_empty()
    }
}

/// Check every enabled item once and record what changed
pub async fn run_cycle<S, A>(
    source: &S,
    registry: &mut Registry,
    notifier: &mut Notifier<A>,
    auto_stop: bool,
) -> CycleSummary
where
    S: BeatmapSource,
    A: AlertSink,
{
    let ids = registry.enabled_ids();
    let outcomes = poll_once(source, &ids).await;
    let now = Utc::now();
    let report = apply_outcomes(registry, outcomes, now);

    for transition in &report.transitions {
        notifier.notify(transition, now);
    }

    let stopped = if auto_stop {
        apply_auto_stop(registry, &report.transitions)
    } else {
        Vec::new()
    };

    CycleSummary { report, stopped }
}

/// Add the given ids, skipping ones already tracked or not found
pub async fn add_ids<S: BeatmapSource>(source: &S, registry: &mut Registry, ids: &[u64]) -> usize {
    let mut added = 0;
    for &id in ids {
        match add_tracked(registry, source, id).await {
            Ok(item) => {
                println!("Tracking #{} {} ({})", item.id, item.display_title(), item.status.label());
                added += 1;
            }
            Err(err) => eprintln!("Skipping {id}: {err}"),
        }
    }
    added
}

fn save(store: &ConfigStore, settings: &Settings, registry: &Registry) -> Result<()> {
    let config = ConfigFile {
        settings: settings.clone(),
        beatmaps: registry.to_vec(),
    };
    store.save(&config)?;
    Ok(())
}

/// Run until Ctrl-C, an auth failure, or nothing is left to track.
///
/// `settings` are the persisted settings; `effective` has the command-line
/// overrides applied and drives this run.
pub async fn run<S, A>(
    source: &S,
    store: &ConfigStore,
    config: ConfigFile,
    effective: &Settings,
    notifier: Notifier<A>,
    add: &[u64],
) -> Result<()>
where
    S: BeatmapSource,
    A: AlertSink,
{
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_until(source, store, config, effective, notifier, add, ctrl_c).await
}

/// Same as [`run`], stopping when `shutdown` completes. A cycle in progress
/// is abandoned and the registry as of the last finished cycle is saved.
pub async fn run_until<S, A, F>(
    source: &S,
    store: &ConfigStore,
    config: ConfigFile,
    effective: &Settings,
    mut notifier: Notifier<A>,
    add: &[u64],
    shutdown: F,
) -> Result<()>
where
    S: BeatmapSource,
    A: AlertSink,
    F: Future<Output = ()>,
{
    let settings = config.settings;
    let mut registry = Registry::from_items(config.beatmaps);

    if add_ids(source, &mut registry, add).await > 0 {
        save(store, &settings, &registry)?;
    }

    if !effective.has_credentials() {
        return Err(Error::InvalidArgument(
            "no API credentials, set client_id and client_secret in config.json".to_string(),
        ));
    }

    let mut ticker = time::interval(effective.check_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        items = registry.enabled_count(),
        interval_ms = effective.check_interval().as_millis() as u64,
        "Headless tracking started"
    );
    println!(
        "Tracking {} beatmapset(s), press Ctrl-C to stop",
        registry.enabled_count()
    );

    tokio::pin!(shutdown);

    loop {
        if registry.enabled_count() == 0 {
            println!("Nothing left to track");
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }

        let summary = tokio::select! {
            summary = run_cycle(
                source,
                &mut registry,
                &mut notifier,
                effective.auto_stop_monitoring,
            ) => summary,
            _ = &mut shutdown => {
                info!("Interrupted during a check");
                break;
            }
        };

        if summary.is_dirty() {
            save(store, &settings, &registry)?;
        }

        if let Some(err) = summary.report.auth_failure() {
            error!(error = %err, "Authentication failed, stopping");
            return Err(err.clone().into());
        }
    }

    save(store, &settings, &registry)
}
