//! Status transition records kept in the history log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{GameMode, RankStatus};
use crate::registry::parse_beatmapset_id;

/// One observed status change. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub beatmapset_id: u64,
    /// "artist - title" at the time of the change
    pub title: String,
    pub creator: String,
    pub old_status: RankStatus,
    pub new_status: RankStatus,
    #[serde(default)]
    pub ranked_date: Option<String>,
    #[serde(default)]
    pub mode: GameMode,
}

impl HistoryEntry {
    /// Identity in the history log
    pub fn key(&self) -> (i64, u64) {
        (self.timestamp.timestamp_millis(), self.beatmapset_id)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} -> {}",
            self.title,
            self.old_status.label(),
            self.new_status.label()
        )
    }
}

/// What the history view shows. Unset fields match every entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Matches either side of the change
    pub status: Option<RankStatus>,
    pub mode: Option<GameMode>,
    /// Substring of title, creator or id. A beatmapset URL matches its id.
    pub text: String,
}

impl HistoryFilter {
    pub fn is_active(&self) -> bool {
        self.status.is_some() || self.mode.is_some() || !self.text.trim().is_empty()
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some(status) = self.status {
            if entry.old_status != status && entry.new_status != status {
                return false;
            }
        }
        if self.mode.is_some_and(|mode| mode != entry.mode) {
            return false;
        }

        let text = self.text.trim();
        if text.is_empty() {
            return true;
        }
        if text.contains('/') {
            if let Some(id) = parse_beatmapset_id(text) {
                return entry.beatmapset_id == id;
            }
        }
        format!("{} {} {}", entry.title, entry.creator, entry.beatmapset_id)
            .to_lowercase()
            .contains(&text.to_lowercase())
    }

    /// Step through every status, then back to none
    pub fn cycle_status(&mut self) {
        self.status = match self.status {
            None => RankStatus::ALL.first().copied(),
            Some(current) => RankStatus::ALL
                .iter()
                .skip_while(|status| **status != current)
                .nth(1)
                .copied(),
        };
    }

    pub fn cycle_mode(&mut self) {
        self.mode = match self.mode {
            None => Some(GameMode::Osu),
            Some(GameMode::Osu) => Some(GameMode::Taiko),
            Some(GameMode::Taiko) => Some(GameMode::Fruits),
            Some(GameMode::Fruits) => Some(GameMode::Mania),
            Some(GameMode::Mania) => None,
        };
    }

    /// Short description for the view title, empty when nothing is filtered
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(status.label().to_string());
        }
        if let Some(mode) = self.mode {
            parts.push(mode.label().to_string());
        }
        if !self.text.trim().is_empty() {
            parts.push(format!("\"{}\"", self.text.trim()));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blue_zenith() -> HistoryEntry {
        HistoryEntry {
            timestamp: Utc::now(),
            beatmapset_id: 7,
            title: "xi - Blue Zenith".to_string(),
            creator: "Asphyxia".to_string(),
            old_status: RankStatus::Qualified,
            new_status: RankStatus::Ranked,
            ranked_date: None,
            mode: GameMode::Osu,
        }
    }

    #[test]
    fn test_summary_format() {
        assert_eq!(blue_zenith().summary(), "xi - Blue Zenith: Qualified -> Ranked");
    }

    #[test]
    fn test_filter_status_matches_either_side() {
        let entry = blue_zenith();
        let mut filter = HistoryFilter::default();
        assert!(!filter.is_active());
        assert!(filter.matches(&entry));

        filter.status = Some(RankStatus::Qualified);
        assert!(filter.matches(&entry));
        filter.status = Some(RankStatus::Ranked);
        assert!(filter.matches(&entry));
        filter.status = Some(RankStatus::Loved);
        assert!(!filter.matches(&entry));
    }

    #[test]
    fn test_filter_mode() {
        let entry = blue_zenith();
        let filter = HistoryFilter {
            mode: Some(GameMode::Mania),
            ..HistoryFilter::default()
        };
        assert!(!filter.matches(&entry));
    }

    #[test]
    fn test_filter_text_and_url() {
        let entry = blue_zenith();
        let text = |text: &str| HistoryFilter {
            text: text.to_string(),
            ..HistoryFilter::default()
        };

        assert!(text("blue zen").matches(&entry));
        assert!(text("ASPHYXIA").matches(&entry));
        assert!(text("7").matches(&entry));
        assert!(!text("camellia").matches(&entry));
        assert!(text("https://osu.ppy.sh/beatmapsets/7#osu/11").matches(&entry));
        assert!(!text("https://osu.ppy.sh/beatmapsets/77").matches(&entry));
    }

    #[test]
    fn test_filter_cycles_back_to_none() {
        let mut filter = HistoryFilter::default();
        for _ in 0..RankStatus::ALL.len() {
            filter.cycle_status();
            assert!(filter.status.is_some());
        }
        filter.cycle_status();
        assert_eq!(filter.status, None);

        for _ in 0..4 {
            filter.cycle_mode();
        }
        assert_eq!(filter.mode, Some(GameMode::Mania));
        filter.cycle_mode();
        assert_eq!(filter.mode, None);

        filter.status = Some(RankStatus::Loved);
        filter.text = " frums ".to_string();
        assert_eq!(filter.describe(), "Loved, \"frums\"");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "timestamp": "2026-03-01T12:00:00Z",
            "beatmapset_id": 42,
            "title": "a - b",
            "creator": "c",
            "old_status": "pending",
            "new_status": "qualified"
        }"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mode, GameMode::Osu);
        assert!(entry.ranked_date.is_none());
        assert_eq!(entry.new_status, RankStatus::Qualified);
    }
}
