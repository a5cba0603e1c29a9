//! osu! API v2 integration.
//!
//! This module encapsulates all network access:
//! - `client`: OAuth token cache, beatmapset lookup and search
//! - `models`: response shapes and their normalization
//! - `error`: the error type shared by every request

mod client;
mod error;
mod models;

use std::future::Future;

pub use client::{Credentials, OsuClient, SearchPage, SearchQuery, DEFAULT_BASE_URL};
pub use error::ApiError;

use crate::models::BeatmapInfo;

/// Anything that can answer beatmapset lookups. The poller and the registry
/// only depend on this, so tests can script responses.
pub trait BeatmapSource: Send + Sync {
    fn fetch_beatmapset(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<BeatmapInfo, ApiError>> + Send;

    fn search_beatmapsets(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchPage, ApiError>> + Send;

    fn set_credentials(&self, _credentials: Credentials) -> impl Future<Output = ()> + Send {
        async {}
    }
}
