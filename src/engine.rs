/// Engine facade handed to the presentation layer
///
/// Owns the collaborators and the competition's aggregation rules. All state
/// is scoped to the instance; nothing here reads ambient globals.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::StandingsCache;
use crate::config::CompetitionConfig;
use crate::data_provider::{ExternalFeed, LocalStore};
use crate::error::{EngineError, EngineResult, SourceError};
use crate::reconcile;
use crate::scheduler::{LiveRefreshScheduler, RefreshHandle};
use crate::search::{self, FeedHandle, LiveFeedHandle, Resolved, SearchCriteria, SourceHandle, SourceKind, StoreHandle};
use crate::standings::{Aggregator, StandingsResult};
use crate::types::Match;

#[derive(Clone)]
pub struct Engine {
    feed: Arc<dyn ExternalFeed>,
    store: Arc<dyn LocalStore>,
    competition_id: String,
    aggregator: Aggregator,
    standings_cache: StandingsCache,
}

impl Engine {
    pub fn new(
        feed: Arc<dyn ExternalFeed>,
        store: Arc<dyn LocalStore>,
        competition: &CompetitionConfig,
    ) -> EngineResult<Self> {
        let aggregator = Aggregator::new(
            competition.groups.clone(),
            competition.overall_zones.clone(),
            competition.group_zones.clone(),
        )?;
        Ok(Self {
            feed,
            store,
            competition_id: competition.id.clone(),
            aggregator,
            standings_cache: StandingsCache::new(),
        })
    }

    /// Live, upcoming and recent feed matches reconciled with the store
    pub async fn get_unified_matches(&self) -> EngineResult<Vec<Match>> {
        unified_matches(self.feed.as_ref(), self.store.as_ref()).await
    }

    pub async fn get_standings(&self) -> EngineResult<StandingsResult> {
        let raw = self
            .standings_cache
            .fetch(self.feed.as_ref(), &self.competition_id)
            .await
            .map_err(|e| SourceError::from_anyhow(self.feed.source_name(), &e))?;
        self.aggregator.aggregate(&raw)
    }

    /// Same as `get_standings` but bypasses the standings cache
    pub async fn refresh_standings(&self) -> EngineResult<StandingsResult> {
        let raw = self
            .standings_cache
            .refresh(self.feed.as_ref(), &self.competition_id)
            .await
            .map_err(|e| SourceError::from_anyhow(self.feed.source_name(), &e))?;
        self.aggregator.aggregate(&raw)
    }

    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        order: &[SourceKind],
    ) -> EngineResult<Resolved> {
        search::resolve(criteria, &self.handles(order)).await
    }

    pub fn handles(&self, order: &[SourceKind]) -> Vec<Arc<dyn SourceHandle>> {
        order
            .iter()
            .map(|kind| -> Arc<dyn SourceHandle> {
                match kind {
                    SourceKind::Feed => Arc::new(FeedHandle(Arc::clone(&self.feed))),
                    SourceKind::Live => Arc::new(LiveFeedHandle(Arc::clone(&self.feed))),
                    SourceKind::Store => Arc::new(StoreHandle(Arc::clone(&self.store))),
                }
            })
            .collect()
    }

    pub async fn promote(&self, game: &Match, section_id: Option<i64>) -> EngineResult<Match> {
        reconcile::promote(self.store.as_ref(), game, section_id).await
    }

    /// Start polling the unified view; liveness is judged from the last
    /// snapshot the scheduler itself published
    pub async fn start_live_refresh(&self, interval: Duration) -> RefreshHandle {
        let (seed, seeded) = match self.get_unified_matches().await {
            Ok(matches) => (matches, true),
            Err(e) => {
                warn!("ENGINE: Initial fetch for live refresh failed: {}", e);
                (Vec::new(), false)
            }
        };

        let feed = Arc::clone(&self.feed);
        let store = Arc::clone(&self.store);
        let handle = LiveRefreshScheduler::start_tracked(interval, seed, move || {
            let feed = Arc::clone(&feed);
            let store = Arc::clone(&store);
            async move {
                unified_matches(feed.as_ref(), store.as_ref())
                    .await
                    .map_err(anyhow::Error::from)
            }
        });
        if !seeded {
            handle.refresh_now();
        }
        handle
    }
}

async fn unified_matches(feed: &dyn ExternalFeed, store: &dyn LocalStore) -> EngineResult<Vec<Match>> {
    let feed_lists = async {
        futures::try_join!(
            feed.fetch_live_matches(),
            feed.fetch_upcoming_matches(),
            feed.fetch_results_recent(),
        )
        .map_err(|e| EngineError::from(SourceError::from_anyhow(feed.source_name(), &e)))
    };
    let stored = async {
        store
            .list()
            .await
            .map_err(|e| EngineError::from(SourceError::from_anyhow(store.source_name(), &e)))
    };
    let ((live, upcoming, recent), local) = futures::try_join!(feed_lists, stored)?;

    let external = merge_feed_lists([live, upcoming, recent]);
    debug!("ENGINE: {} feed matches, {} stored", external.len(), local.len());
    Ok(reconcile::reconcile(&external, &local))
}

/// The feed's lists overlap around kickoff and full time; keep the first
/// (most live) copy of each match
fn merge_feed_lists<const N: usize>(lists: [Vec<Match>; N]) -> Vec<Match> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|m| seen.insert(m.external_code.clone()))
        .collect()
}
