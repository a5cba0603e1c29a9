//! Beatmapset metadata as the rest of the app sees it, plus the tracked item
//! built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{GameMode, RankStatus};

/// One difficulty inside a beatmapset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub name: String,
    pub stars: f64,
    #[serde(default)]
    pub mode: GameMode,
    /// Drain length in seconds
    #[serde(default)]
    pub length_secs: u32,
    #[serde(default)]
    pub spinners: u32,
}

/// Normalized beatmapset returned by a lookup or a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapInfo {
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub status: RankStatus,
    /// Ranked date if present, otherwise the submission date
    pub ranked_date: Option<String>,
    /// Mode of the hardest difficulty
    pub mode: GameMode,
    /// Sorted hardest first
    pub difficulties: Vec<Difficulty>,
}

impl BeatmapInfo {
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    pub fn max_stars(&self) -> f64 {
        self.difficulties.first().map(|d| d.stars).unwrap_or(0.0)
    }
}

/// A beatmapset the user monitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub creator: String,
    /// Status from the most recent successful fetch
    pub status: RankStatus,
    /// Whether the poller requests this item
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub difficulties: Vec<Difficulty>,
    #[serde(default)]
    pub ranked_date: Option<String>,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl TrackedItem {
    pub fn from_info(info: BeatmapInfo, now: DateTime<Utc>) -> Self {
        Self {
            id: info.id,
            artist: info.artist,
            title: info.title,
            creator: info.creator,
            status: info.status,
            enabled: true,
            mode: info.mode,
            difficulties: info.difficulties,
            ranked_date: info.ranked_date,
            added_at: now,
            last_checked: Some(now),
        }
    }

    /// Overwrite everything the API owns with a fresh fetch and return the
    /// status that was stored before.
    pub fn refresh_from(&mut self, info: BeatmapInfo, now: DateTime<Utc>) -> RankStatus {
        let previous = self.status;
        self.artist = info.artist;
        self.title = info.title;
        self.creator = info.creator;
        self.status = info.status;
        self.mode = info.mode;
        if !info.difficulties.is_empty() {
            self.difficulties = info.difficulties;
        }
        if info.ranked_date.is_some() {
            self.ranked_date = info.ranked_date;
        }
        self.last_checked = Some(now);
        previous
    }

    pub fn display_title(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    pub fn url(&self) -> String {
        format!("https://osu.ppy.sh/beatmapsets/{}", self.id)
    }
}
