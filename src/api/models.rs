//! Wire shapes of the osu! API v2 responses we read, and their conversion
//! into [`BeatmapInfo`].

use serde::Deserialize;

use crate::models::{BeatmapInfo, Difficulty, GameMode, RankStatus};

/// `POST /oauth/token` response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<u64>,
}

/// Beatmapset object as returned by lookup and search
#[derive(Debug, Clone, Deserialize)]
pub struct RawBeatmapset {
    pub id: u64,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ranked_date: Option<String>,
    #[serde(default)]
    pub submitted_date: Option<String>,
    #[serde(default)]
    pub beatmaps: Vec<RawBeatmap>,
}

/// Single difficulty inside a beatmapset
#[derive(Debug, Clone, Deserialize)]
pub struct RawBeatmap {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub difficulty_rating: f64,
    #[serde(default)]
    pub mode_int: u8,
    #[serde(default)]
    pub total_length: u32,
    #[serde(default)]
    pub count_spinners: u32,
}

/// `GET /api/v2/beatmapsets/search` response
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub beatmapsets: Vec<RawBeatmapset>,
    #[serde(default)]
    pub cursor_string: Option<String>,
}

fn round_stars(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<RawBeatmapset> for BeatmapInfo {
    fn from(raw: RawBeatmapset) -> Self {
        let mut beatmaps = raw.beatmaps;
        beatmaps.sort_by(|a, b| b.difficulty_rating.total_cmp(&a.difficulty_rating));

        let mode = beatmaps
            .first()
            .map(|b| GameMode::from_int(b.mode_int))
            .unwrap_or_default();

        let difficulties = beatmaps
            .into_iter()
            .map(|b| Difficulty {
                name: if b.version.is_empty() { "?".to_string() } else { b.version },
                stars: round_stars(b.difficulty_rating),
                mode: GameMode::from_int(b.mode_int),
                length_secs: b.total_length,
                spinners: b.count_spinners,
            })
            .collect();

        BeatmapInfo {
            id: raw.id,
            artist: raw.artist,
            title: raw.title,
            creator: raw.creator,
            status: raw
                .status
                .as_deref()
                .map(RankStatus::from_api)
                .unwrap_or(RankStatus::Pending),
            ranked_date: raw.ranked_date.or(raw.submitted_date),
            mode,
            difficulties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP_BODY: &str = r#"{
        "id": 2059431,
        "artist": "Frums",
        "title": "Credits",
        "creator": "Naxess",
        "status": "qualified",
        "ranked_date": null,
        "submitted_date": "2026-09-30T18:22:11Z",
        "beatmaps": [
            {"version": "Normal", "difficulty_rating": 2.1234, "mode_int": 0, "total_length": 180, "count_spinners": 0},
            {"version": "Insane", "difficulty_rating": 5.4567, "mode_int": 3, "total_length": 181, "count_spinners": 2},
            {"version": "Hard", "difficulty_rating": 3.999, "mode_int": 0, "total_length": 180, "count_spinners": 1}
        ],
        "play_count": 12345
    }"#;

    #[test]
    fn test_lookup_body_normalizes() {
        let raw: RawBeatmapset = serde_json::from_str(LOOKUP_BODY).unwrap();
        let info = BeatmapInfo::from(raw);

        assert_eq!(info.id, 2059431);
        assert_eq!(info.status, RankStatus::Qualified);
        assert_eq!(info.ranked_date.as_deref(), Some("2026-09-30T18:22:11Z"));
        assert_eq!(info.mode, GameMode::Mania);

        let names: Vec<&str> = info.difficulties.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Insane", "Hard", "Normal"]);
        assert_eq!(info.difficulties[0].stars, 5.46);
        assert_eq!(info.difficulties[2].stars, 2.12);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let raw: RawBeatmapset = serde_json::from_str(r#"{"id": 9}"#).unwrap();
        let info = BeatmapInfo::from(raw);
        assert_eq!(info.status, RankStatus::Pending);
        assert_eq!(info.mode, GameMode::Osu);
        assert!(info.difficulties.is_empty());
        assert!(info.ranked_date.is_none());
    }

    #[test]
    fn test_ranked_date_preferred_over_submitted() {
        let raw: RawBeatmapset = serde_json::from_str(
            r#"{"id": 1, "status": "ranked", "ranked_date": "2026-10-01T00:00:00Z", "submitted_date": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let info = BeatmapInfo::from(raw);
        assert_eq!(info.ranked_date.as_deref(), Some("2026-10-01T00:00:00Z"));
    }

    #[test]
    fn test_search_response_cursor() {
        let body = r#"{"beatmapsets": [{"id": 1, "status": "qualified"}, {"id": 2, "status": "loved"}], "cursor_string": "eyJhIjoxfQ"}"#;
        let response: RawSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.beatmapsets.len(), 2);
        assert_eq!(response.cursor_string.as_deref(), Some("eyJhIjoxfQ"));
    }

    #[test]
    fn test_token_response_without_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"error": "invalid_client"}"#).unwrap();
        assert!(response.access_token.is_none());
    }
}
