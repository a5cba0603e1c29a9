//! osu! API v2 client
//!
//! Client-credentials OAuth2 with an in-memory token cache, beatmapset lookup
//! by id and beatmapset search.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::models::{RawBeatmapset, RawSearchResponse, TokenResponse};
use super::BeatmapSource;
use crate::models::{BeatmapInfo, GameMode, RankStatus};

pub const DEFAULT_BASE_URL: &str = "https://osu.ppy.sh";
const USER_AGENT: &str = concat!("mapwatch-tui/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Tokens are renewed this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Used when the token response omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

/// OAuth client id and secret registered on the osu! website
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Debug, Default)]
struct AuthState {
    credentials: Credentials,
    token: Option<CachedToken>,
}

/// Filters for a beatmapset search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub status: Option<RankStatus>,
    pub mode: Option<GameMode>,
    pub sort: Option<String>,
    /// Opaque pagination cursor from the previous page
    pub cursor: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            status: Some(RankStatus::Qualified),
            mode: None,
            sort: None,
            cursor: None,
        }
    }
}

/// Status filters offered when browsing. `None` searches every status.
const STATUS_FILTERS: [Option<RankStatus>; 6] = [
    Some(RankStatus::Qualified),
    Some(RankStatus::Ranked),
    Some(RankStatus::Loved),
    Some(RankStatus::Pending),
    Some(RankStatus::Graveyard),
    None,
];

const MODE_FILTERS: [Option<GameMode>; 5] = [
    None,
    Some(GameMode::Osu),
    Some(GameMode::Taiko),
    Some(GameMode::Fruits),
    Some(GameMode::Mania),
];

/// API sort keys and their labels. `None` keeps the server's default order.
const SORT_ORDERS: [(Option<&str>, &str); 6] = [
    (None, "Relevance"),
    (Some("ranked_desc"), "Newest"),
    (Some("ranked_asc"), "Oldest"),
    (Some("title_asc"), "Title"),
    (Some("plays_desc"), "Most played"),
    (Some("difficulty_desc"), "Stars"),
];

/// The option after `current`, wrapping around. Unknown values restart the list.
fn next_option<T: Copy + PartialEq>(options: &[T], current: T) -> T {
    match options.iter().position(|option| *option == current) {
        Some(index) => options[(index + 1) % options.len()],
        None => options[0],
    }
}

impl SearchQuery {
    pub fn cycle_status(&mut self) {
        self.status = next_option(&STATUS_FILTERS, self.status);
    }

    pub fn cycle_mode(&mut self) {
        self.mode = next_option(&MODE_FILTERS, self.mode);
    }

    pub fn cycle_sort(&mut self) {
        let index = SORT_ORDERS
            .iter()
            .position(|(key, _)| *key == self.sort.as_deref())
            .map_or(0, |index| (index + 1) % SORT_ORDERS.len());
        self.sort = SORT_ORDERS[index].0.map(str::to_string);
    }

    pub fn status_label(&self) -> &'static str {
        self.status.map_or("Any status", |status| status.label())
    }

    pub fn mode_label(&self) -> &'static str {
        self.mode.map_or("All modes", |mode| mode.label())
    }

    pub fn sort_label(&self) -> &str {
        SORT_ORDERS
            .iter()
            .find(|(key, _)| *key == self.sort.as_deref())
            .map_or_else(|| self.sort.as_deref().unwrap_or("Relevance"), |(_, label)| *label)
    }

    /// Same filters, next page
    pub fn with_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("nsfw", "true".to_string())];
        let status = self.status.map_or("any", |status| status.search_key());
        params.push(("s", status.to_string()));
        if let Some(mode) = self.mode {
            params.push(("m", mode.as_int().to_string()));
        }
        if !self.text.trim().is_empty() {
            params.push(("q", self.text.trim().to_string()));
        }
        if let Some(sort) = self.sort.as_ref().filter(|s| !s.is_empty()) {
            params.push(("sort", sort.clone()));
        }
        if let Some(cursor) = self.cursor.as_ref().filter(|c| !c.is_empty()) {
            params.push(("cursor_string", cursor.clone()));
        }
        params
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub sets: Vec<BeatmapInfo>,
    /// Cursor for the next page; `None` on the last page
    pub cursor: Option<String>,
}

/// osu! API v2 client
pub struct OsuClient {
    http: reqwest::Client,
    base_url: String,
    auth: Mutex<AuthState>,
}

impl OsuClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Mutex::new(AuthState {
                credentials,
                token: None,
            }),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    fn beatmapset_url(&self, id: u64) -> String {
        format!("{}/api/v2/beatmapsets/{}", self.base_url, id)
    }

    fn search_url(&self) -> String {
        format!("{}/api/v2/beatmapsets/search", self.base_url)
    }

    /// Return a cached bearer token or exchange the credentials for a new one.
    ///
    /// The auth lock is held across the exchange so concurrent callers wait
    /// for a single token request instead of each issuing their own.
    async fn access_token(&self) -> Result<String, ApiError> {
        let mut auth = self.auth.lock().await;

        if let Some(token) = auth.token.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        if !auth.credentials.is_complete() {
            return Err(ApiError::MissingCredentials);
        }

        debug!(url = %self.token_url(), "Requesting OAuth token");

        let form = [
            ("client_id", auth.credentials.client_id.trim().to_string()),
            ("client_secret", auth.credentials.client_secret.trim().to_string()),
            ("grant_type", "client_credentials".to_string()),
            ("scope", "public".to_string()),
        ];

        let response = self
            .http
            .post(self.token_url())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth(format!(
                "token request rejected ({}), check client id and secret",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), body));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let Some(value) = body.access_token else {
            return Err(ApiError::Auth(
                "token response did not contain an access token".to_string(),
            ));
        };

        let lifetime = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        info!(expires_in_secs = lifetime.as_secs(), "Obtained OAuth token");

        auth.token = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }

    async fn invalidate_token(&self) {
        self.auth.lock().await.token = None;
    }

    /// Map non-success statuses to errors. `id` is used for 404s on lookups.
    async fn check_response(
        &self,
        response: reqwest::Response,
        id: Option<u64>,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ApiError::NotFound(id));
            }
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected bearer token, dropping cached token");
            self.invalidate_token().await;
            return Err(ApiError::Auth(
                "unauthorized (invalid credentials)".to_string(),
            ));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status(status.as_u16(), body))
    }

    /// Lookup a beatmapset by id
    pub async fn lookup_beatmapset(&self, id: u64) -> Result<BeatmapInfo, ApiError> {
        let token = self.access_token().await?;
        let url = self.beatmapset_url(id);

        debug!(id, url = %url, "Querying beatmapset");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let raw: RawBeatmapset = self
            .check_response(response, Some(id))
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let info = BeatmapInfo::from(raw);

        debug!(id, status = %info.status, title = %info.display_title(), "Retrieved beatmapset");

        Ok(info)
    }

    /// Search beatmapsets
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let token = self.access_token().await?;
        let params = query.to_params();

        debug!(?params, "Searching beatmapsets");

        let response = self
            .http
            .get(self.search_url())
            .bearer_auth(&token)
            .header(ACCEPT, "application/json")
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let raw: RawSearchResponse = self
            .check_response(response, None)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let page = SearchPage {
            sets: raw.beatmapsets.into_iter().map(BeatmapInfo::from).collect(),
            cursor: raw.cursor_string,
        };

        info!(results = page.sets.len(), more = page.cursor.is_some(), "Search finished");

        Ok(page)
    }

    /// Replace the credentials. The cached token is dropped when they change.
    pub async fn update_credentials(&self, credentials: Credentials) {
        let mut auth = self.auth.lock().await;
        if auth.credentials != credentials {
            debug!("Credentials changed, clearing cached token");
            auth.credentials = credentials;
            auth.token = None;
        }
    }
}

impl BeatmapSource for OsuClient {
    async fn fetch_beatmapset(&self, id: u64) -> Result<BeatmapInfo, ApiError> {
        self.lookup_beatmapset(id).await
    }

    async fn search_beatmapsets(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        self.search(query).await
    }

    async fn set_credentials(&self, credentials: Credentials) {
        self.update_credentials(credentials).await;
    }
}
