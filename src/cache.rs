use crate::data_provider::ExternalFeed;
use crate::types::TeamStanding;
use anyhow::Result;
use cached::{Cached, TimedSizedCache};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Competitions kept per cache
const STANDINGS_CACHE_SIZE: usize = 8;

/// Standings change at most once per match, so a minute of staleness is fine
const STANDINGS_CACHE_SECONDS: u64 = 60;

/// Standings memoized by competition id; clones share the same entries
#[derive(Clone)]
pub struct StandingsCache {
    inner: Arc<Mutex<TimedSizedCache<String, Vec<TeamStanding>>>>,
}

impl StandingsCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimedSizedCache::with_size_and_lifespan(
                STANDINGS_CACHE_SIZE,
                STANDINGS_CACHE_SECONDS,
            ))),
        }
    }

    /// Cached standings, fetching from `feed` on a miss. Errors are not cached.
    pub async fn fetch(&self, feed: &dyn ExternalFeed, competition_id: &str) -> Result<Vec<TeamStanding>> {
        let key = competition_id.to_string();
        if let Some(hit) = self.inner.lock().await.cache_get(&key) {
            debug!("CACHE: Standings hit for {}", competition_id);
            return Ok(hit.clone());
        }

        let standings = feed.fetch_standings(competition_id).await?;
        self.inner.lock().await.cache_set(key, standings.clone());
        Ok(standings)
    }

    /// Drop the cached entry for `competition_id` and fetch again
    pub async fn refresh(&self, feed: &dyn ExternalFeed, competition_id: &str) -> Result<Vec<TeamStanding>> {
        self.inner.lock().await.cache_remove(&competition_id.to_string());
        self.fetch(feed, competition_id).await
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.cache_size()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.cache_clear();
    }
}

impl Default for StandingsCache {
    fn default() -> Self {
        Self::new()
    }
}
