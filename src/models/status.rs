//! Ranked status and game mode enums shared by the API layer, the registry
//! and the history log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a beatmapset on osu!.
///
/// Declaration order is the ordering used for comparisons, so a beatmapset
/// moving "up" the list (Pending -> Qualified -> Ranked) compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankStatus {
    Graveyard,
    Wip,
    Pending,
    Qualified,
    Ranked,
    Approved,
    Loved,
}

impl RankStatus {
    pub const ALL: [RankStatus; 7] = [
        RankStatus::Graveyard,
        RankStatus::Wip,
        RankStatus::Pending,
        RankStatus::Qualified,
        RankStatus::Ranked,
        RankStatus::Approved,
        RankStatus::Loved,
    ];

    /// Map the status string returned by the API. Unknown values fall back
    /// to `Pending`, which is what the API reports for fresh uploads.
    pub fn from_api(value: &str) -> Self {
        value.parse().unwrap_or(RankStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankStatus::Graveyard => "graveyard",
            RankStatus::Wip => "wip",
            RankStatus::Pending => "pending",
            RankStatus::Qualified => "qualified",
            RankStatus::Ranked => "ranked",
            RankStatus::Approved => "approved",
            RankStatus::Loved => "loved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankStatus::Graveyard => "Graveyard",
            RankStatus::Wip => "WIP",
            RankStatus::Pending => "Pending",
            RankStatus::Qualified => "Qualified",
            RankStatus::Ranked => "Ranked",
            RankStatus::Approved => "Approved",
            RankStatus::Loved => "Loved",
        }
    }

    /// Short phrase shown in the status line when an item reaches this state.
    pub fn message(&self) -> &'static str {
        match self {
            RankStatus::Graveyard => "Abandoned",
            RankStatus::Wip => "Work in progress",
            RankStatus::Pending => "Pending approval",
            RankStatus::Qualified => "Qualified",
            RankStatus::Ranked => "RANKED!",
            RankStatus::Approved => "Approved",
            RankStatus::Loved => "Loved",
        }
    }

    /// Final states have a leaderboard and no longer move on their own.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RankStatus::Ranked | RankStatus::Approved | RankStatus::Loved
        )
    }

    /// Value for the `s` parameter of the beatmapset search endpoint.
    pub fn search_key(&self) -> &'static str {
        match self {
            RankStatus::Approved => "ranked",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for RankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RankStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        RankStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| format!("unknown ranked status: {s}"))
    }
}

/// Ruleset a difficulty is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Osu,
    Taiko,
    Fruits,
    Mania,
}

impl GameMode {
    pub fn from_int(value: u8) -> Self {
        match value {
            1 => GameMode::Taiko,
            2 => GameMode::Fruits,
            3 => GameMode::Mania,
            _ => GameMode::Osu,
        }
    }

    pub fn as_int(&self) -> u8 {
        match self {
            GameMode::Osu => 0,
            GameMode::Taiko => 1,
            GameMode::Fruits => 2,
            GameMode::Mania => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Osu => "osu",
            GameMode::Taiko => "taiko",
            GameMode::Fruits => "fruits",
            GameMode::Mania => "mania",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Osu => "osu!",
            GameMode::Taiko => "Taiko",
            GameMode::Fruits => "Catch",
            GameMode::Mania => "Mania",
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osu" | "0" => Ok(GameMode::Osu),
            "taiko" | "1" => Ok(GameMode::Taiko),
            "fruits" | "catch" | "2" => Ok(GameMode::Fruits),
            "mania" | "3" => Ok(GameMode::Mania),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}
