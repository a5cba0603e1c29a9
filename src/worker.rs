//! Background network worker.
//!
//! The UI thread never blocks on HTTP. It sends [`WorkerCommand`]s to a tokio
//! task that owns the [`BeatmapSource`] and drains [`WorkerEvent`]s on every
//! tick.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::api::{ApiError, BeatmapSource, Credentials, SearchPage, SearchQuery};
use crate::models::BeatmapInfo;
use crate::poller::{poll_once, PollOutcome};

#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Fetch every id and report the outcomes as one batch
    Poll(Vec<u64>),
    /// Fetch one id for adding to the registry
    Lookup(u64),
    Search(SearchQuery),
    SetCredentials(Credentials),
}

#[derive(Debug)]
pub enum WorkerEvent {
    PollFinished(Vec<PollOutcome>),
    LookupFinished {
        id: u64,
        result: Result<BeatmapInfo, ApiError>,
    },
    SearchFinished {
        query: SearchQuery,
        result: Result<SearchPage, ApiError>,
    },
}

/// UI-side ends of the worker channels
pub struct WorkerHandle {
    commands: UnboundedSender<WorkerCommand>,
    events: UnboundedReceiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Queue a command. Returns false once the worker is gone.
    pub fn send(&self, command: WorkerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn try_recv(&mut self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Handle wired to plain channels, for driving the app without a runtime
    #[cfg(test)]
    pub fn detached() -> (
        Self,
        UnboundedReceiver<WorkerCommand>,
        UnboundedSender<WorkerEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                commands: cmd_tx,
                events: event_rx,
            },
            cmd_rx,
            event_tx,
        )
    }
}

async fn run_command<S: BeatmapSource>(source: &S, command: WorkerCommand) -> Option<WorkerEvent> {
    match command {
        WorkerCommand::Poll(ids) => {
            debug!(count = ids.len(), "Starting poll cycle");
            Some(WorkerEvent::PollFinished(poll_once(source, &ids).await))
        }
        WorkerCommand::Lookup(id) => Some(WorkerEvent::LookupFinished {
            id,
            result: source.fetch_beatmapset(id).await,
        }),
        WorkerCommand::Search(query) => {
            let result = source.search_beatmapsets(&query).await;
            Some(WorkerEvent::SearchFinished { query, result })
        }
        WorkerCommand::SetCredentials(credentials) => {
            source.set_credentials(credentials).await;
            None
        }
    }
}

/// Spawn the worker loop on `runtime`.
///
/// Credential updates are applied in order before any later command is
/// started. Everything else runs as its own task so a slow poll cycle does
/// not hold up a search.
pub fn spawn_worker<S>(runtime: &Handle, source: Arc<S>) -> WorkerHandle
where
    S: BeatmapSource + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<WorkerCommand>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkerEvent>();

    runtime.spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            if let WorkerCommand::SetCredentials(_) = command {
                run_command(source.as_ref(), command).await;
                continue;
            }

            let source = Arc::clone(&source);
            let events = event_tx.clone();
            tokio::spawn(async move {
                if let Some(event) = run_command(source.as_ref(), command).await {
                    let _ = events.send(event);
                }
            });
        }
        debug!("Worker command channel closed, stopping");
    });

    WorkerHandle {
        commands: cmd_tx,
        events: event_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{info, ScriptedSource};
    use crate::models::RankStatus;
    use std::time::Duration;

    async fn next_event(handle: &mut WorkerHandle) -> WorkerEvent {
        for _ in 0..200 {
            if let Some(event) = handle.try_recv() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("worker produced no event");
    }

    #[tokio::test]
    async fn test_poll_command_reports_outcomes() {
        let source = Arc::new(ScriptedSource::new());
        source.push_status(1, RankStatus::Ranked);
        let mut handle = spawn_worker(&Handle::current(), Arc::clone(&source));

        assert!(handle.send(WorkerCommand::Poll(vec![1, 2])));

        match next_event(&mut handle).await {
            WorkerEvent::PollFinished(outcomes) => {
                assert_eq!(outcomes.len(), 2);
                assert_eq!(outcomes[0].result, Ok(info(1, RankStatus::Ranked)));
                assert_eq!(outcomes[1].result, Err(ApiError::NotFound(2)));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_command() {
        let source = Arc::new(ScriptedSource::new());
        source.push_status(9, RankStatus::Loved);
        let mut handle = spawn_worker(&Handle::current(), Arc::clone(&source));

        handle.send(WorkerCommand::Lookup(9));

        match next_event(&mut handle).await {
            WorkerEvent::LookupFinished { id, result } => {
                assert_eq!(id, 9);
                assert_eq!(result.unwrap().status, RankStatus::Loved);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_command_echoes_query() {
        let source = Arc::new(ScriptedSource::new());
        *source.search_page.lock().unwrap() = Some(SearchPage {
            sets: vec![info(4, RankStatus::Qualified)],
            cursor: Some("c".to_string()),
        });
        let mut handle = spawn_worker(&Handle::current(), Arc::clone(&source));

        let query = SearchQuery {
            text: "frums".to_string(),
            ..SearchQuery::default()
        };
        handle.send(WorkerCommand::Search(query.clone()));

        match next_event(&mut handle).await {
            WorkerEvent::SearchFinished { query: echoed, result } => {
                assert_eq!(echoed, query);
                let page = result.unwrap();
                assert_eq!(page.sets.len(), 1);
                assert_eq!(page.cursor.as_deref(), Some("c"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
