//! Config file watching.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// True if any path in the event refers to the watched file
fn event_matches(paths: &[PathBuf], canonical_target: &Path, target_name: Option<&std::ffi::OsStr>) -> bool {
    paths.iter().any(|p| {
        if let Ok(canonical) = p.canonicalize() {
            if canonical == canonical_target {
                return true;
            }
        }
        // Editors that replace the file leave nothing to canonicalize
        match (target_name, p.file_name()) {
            (Some(expected), Some(actual)) => actual == expected,
            _ => false,
        }
    })
}

/// Set up a file watcher for config.json changes made outside the app
pub fn setup_config_watcher(
    config_path: PathBuf,
    needs_reload: Arc<Mutex<bool>>,
) -> Option<RecommendedWatcher> {
    let config = Config::default().with_poll_interval(Duration::from_millis(500));

    let canonical_config = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.clone());
    let config_filename = config_path.file_name().map(|s| s.to_os_string());

    let watcher_result = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if event_matches(&event.paths, &canonical_config, config_filename.as_deref()) {
                if let Ok(mut flag) = needs_reload.lock() {
                    *flag = true;
                }
            }
        },
        config,
    );

    match watcher_result {
        Ok(mut watcher) => {
            // Watch the parent directory since some editors replace files
            if let Some(parent) = config_path.parent() {
                if let Err(err) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                    warn!(error = %err, "Could not watch config directory");
                    return None;
                }
            }
            debug!(path = %config_path.display(), "Watching config file");
            Some(watcher)
        }
        Err(err) => {
            warn!(error = %err, "Could not create config watcher");
            None
        }
    }
}

/// Read and clear the reload flag
pub fn take_reload_flag(flag: &Arc<Mutex<bool>>) -> bool {
    let Ok(mut flag) = flag.lock() else {
        return false;
    };
    std::mem::take(&mut *flag)
}
