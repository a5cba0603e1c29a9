//! Tracked-item registry.
//!
//! Holds the beatmapsets the user monitors in insertion order. Owned by the
//! UI thread; the poller only ever sees id snapshots.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, BeatmapSource};
use crate::models::TrackedItem;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Beatmapset {0} is already tracked")]
    AlreadyTracked(u64),

    #[error("Beatmapset {0} is not tracked")]
    NotTracked(u64),

    #[error(transparent)]
    Lookup(#[from] ApiError),
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    items: Vec<TrackedItem>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted items. Later duplicates of an id are dropped
    /// with a warning.
    pub fn from_items(items: Vec<TrackedItem>) -> Self {
        let mut registry = Self::new();
        for item in items {
            let id = item.id;
            if let Err(err) = registry.insert(item) {
                warn!(id, error = %err, "Dropping duplicate beatmapset from config");
            }
        }
        registry
    }

    pub fn insert(&mut self, item: TrackedItem) -> Result<&TrackedItem, RegistryError> {
        if self.contains(item.id) {
            return Err(RegistryError::AlreadyTracked(item.id));
        }
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<TrackedItem, RegistryError> {
        let index = self.position(id).ok_or(RegistryError::NotTracked(id))?;
        Ok(self.items.remove(index))
    }

    pub fn set_enabled(&mut self, id: u64, enabled: bool) -> Result<(), RegistryError> {
        let item = self.get_mut(id).ok_or(RegistryError::NotTracked(id))?;
        item.enabled = enabled;
        Ok(())
    }

    /// Flip the tracking flag and return the new value
    pub fn toggle(&mut self, id: u64) -> Result<bool, RegistryError> {
        let enabled = !self.get(id).ok_or(RegistryError::NotTracked(id))?.enabled;
        self.set_enabled(id, enabled)?;
        Ok(enabled)
    }

    /// Items in insertion order
    pub fn list(&self) -> &[TrackedItem] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&TrackedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut TrackedItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Ids the poller should request this cycle
    pub fn enabled_ids(&self) -> Vec<u64> {
        self.items
            .iter()
            .filter(|item| item.enabled)
            .map(|item| item.id)
            .collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.items.iter().filter(|item| item.enabled).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<TrackedItem> {
        self.items.clone()
    }
}

/// Look `id` up through `source` and start tracking it.
///
/// The duplicate check runs before the lookup so re-adding a tracked id never
/// costs a request.
pub async fn add_tracked<'a, S: BeatmapSource>(
    registry: &'a mut Registry,
    source: &S,
    id: u64,
) -> Result<&'a TrackedItem, RegistryError> {
    if registry.contains(id) {
        return Err(RegistryError::AlreadyTracked(id));
    }

    let info = source.fetch_beatmapset(id).await?;
    let item = TrackedItem::from_info(info, Utc::now());

    info!(id, title = %item.display_title(), status = %item.status, "Tracking beatmapset");

    registry.insert(item)
}

/// Extract a beatmapset id from user input.
///
/// Accepts a bare number or a beatmapset URL such as
/// `https://osu.ppy.sh/beatmapsets/123#osu/456` or `https://osu.ppy.sh/s/123`.
/// Difficulty URLs (`/b/`, `/beatmaps/`) are rejected since they carry a
/// beatmap id, not a set id.
pub fn parse_beatmapset_id(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse().ok().filter(|id| *id > 0);
    }

    for marker in ["/beatmapsets/", "/s/"] {
        if let Some(start) = input.find(marker) {
            let digits: String = input[start + marker.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            return digits.parse().ok().filter(|id| *id > 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{info, ScriptedSource};
    use crate::models::RankStatus;

    fn item(id: u64, status: RankStatus) -> TrackedItem {
        TrackedItem::from_info(info(id, status), Utc::now())
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut registry = Registry::new();
        registry.insert(item(1, RankStatus::Pending)).unwrap();
        let err = registry.insert(item(1, RankStatus::Ranked)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyTracked(1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).unwrap().status, RankStatus::Pending);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let mut registry = Registry::new();
        for id in [30, 10, 20] {
            registry.insert(item(id, RankStatus::Pending)).unwrap();
        }
        let ids: Vec<u64> = registry.list().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_remove() {
        let mut registry = Registry::new();
        registry.insert(item(1, RankStatus::Pending)).unwrap();
        registry.insert(item(2, RankStatus::Pending)).unwrap();

        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.id, 1);
        assert!(!registry.contains(1));
        assert_eq!(registry.remove(1), Err(RegistryError::NotTracked(1)));
    }

    #[test]
    fn test_set_enabled_filters_enabled_ids() {
        let mut registry = Registry::new();
        registry.insert(item(1, RankStatus::Pending)).unwrap();
        registry.insert(item(2, RankStatus::Qualified)).unwrap();
        registry.insert(item(3, RankStatus::Pending)).unwrap();

        registry.set_enabled(2, false).unwrap();
        assert_eq!(registry.enabled_ids(), vec![1, 3]);
        assert_eq!(registry.enabled_count(), 2);

        registry.set_enabled(2, true).unwrap();
        assert_eq!(registry.enabled_ids(), vec![1, 2, 3]);
        assert_eq!(
            registry.set_enabled(99, true),
            Err(RegistryError::NotTracked(99))
        );
    }

    #[test]
    fn test_toggle() {
        let mut registry = Registry::new();
        registry.insert(item(1, RankStatus::Pending)).unwrap();
        assert_eq!(registry.toggle(1), Ok(false));
        assert_eq!(registry.toggle(1), Ok(true));
    }

    #[test]
    fn test_from_items_drops_later_duplicates() {
        let registry = Registry::from_items(vec![
            item(1, RankStatus::Pending),
            item(2, RankStatus::Pending),
            item(1, RankStatus::Loved),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().status, RankStatus::Pending);
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_from_items_warns_about_duplicates() {
        let logs = capture_logs(|| {
            Registry::from_items(vec![item(4, RankStatus::Pending), item(4, RankStatus::Ranked)]);
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Dropping duplicate beatmapset from config"));
        assert!(logs.contains("id=4"));
    }

    #[tokio::test]
    async fn test_add_tracked_looks_up_metadata() {
        let source = ScriptedSource::new();
        source.push_status(55, RankStatus::Qualified);
        let mut registry = Registry::new();

        let added = add_tracked(&mut registry, &source, 55).await.unwrap();
        assert_eq!(added.id, 55);
        assert_eq!(added.status, RankStatus::Qualified);
        assert!(added.enabled);
        assert_eq!(source.calls(), vec![55]);
    }

    #[tokio::test]
    async fn test_add_tracked_duplicate_skips_lookup() {
        let source = ScriptedSource::new();
        let mut registry = Registry::new();
        registry.insert(item(55, RankStatus::Pending)).unwrap();

        let err = add_tracked(&mut registry, &source, 55).await.unwrap_err();
        assert_eq!(err, RegistryError::AlreadyTracked(55));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_tracked_lookup_failure() {
        let source = ScriptedSource::new();
        source.push(7, Err(ApiError::Status(500, "boom".to_string())));
        let mut registry = Registry::new();

        let err = add_tracked(&mut registry, &source, 7).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::Lookup(ApiError::Status(500, "boom".to_string()))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_bare_id() {
        assert_eq!(parse_beatmapset_id("1234"), Some(1234));
        assert_eq!(parse_beatmapset_id("  42 "), Some(42));
        assert_eq!(parse_beatmapset_id("0"), None);
        assert_eq!(parse_beatmapset_id(""), None);
    }

    #[test]
    fn test_parse_urls() {
        assert_eq!(
            parse_beatmapset_id("https://osu.ppy.sh/beatmapsets/2059431#osu/4300012"),
            Some(2059431)
        );
        assert_eq!(parse_beatmapset_id("https://osu.ppy.sh/s/39804"), Some(39804));
        assert_eq!(parse_beatmapset_id("osu.ppy.sh/beatmapsets/12"), Some(12));
    }

    #[test]
    fn test_parse_rejects_difficulty_urls_and_garbage() {
        assert_eq!(parse_beatmapset_id("https://osu.ppy.sh/b/129891"), None);
        assert_eq!(parse_beatmapset_id("https://osu.ppy.sh/beatmaps/129891"), None);
        assert_eq!(parse_beatmapset_id("not a map"), None);
        assert_eq!(parse_beatmapset_id("https://osu.ppy.sh/beatmapsets/"), None);
    }
}
