/// Search with an ordered fallback chain of sources
///
/// Each handle is tried in turn; the first one that answers without an
/// error wins, even if it found nothing. Failures are collected so that an
/// exhausted chain reports every cause, not just the last.
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::data_provider::{ExternalFeed, LocalStore};
use crate::error::{EngineError, EngineResult, SourceError};
use crate::types::Match;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    ByDate(NaiveDate),
    ByTeam(String),
    ByDateRange { from: NaiveDate, to: NaiveDate },
}

impl SearchCriteria {
    /// Client-side filter for sources that can only list everything
    pub fn matches(&self, game: &Match) -> bool {
        match self {
            SearchCriteria::ByDate(date) => game.kickoff_date() == *date,
            SearchCriteria::ByTeam(name) => game.involves_team(name),
            SearchCriteria::ByDateRange { from, to } => (*from..=*to).contains(&game.kickoff_date()),
        }
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriteria::ByDate(date) => write!(f, "date {}", date),
            SearchCriteria::ByTeam(name) => write!(f, "team '{}'", name),
            SearchCriteria::ByDateRange { from, to } => write!(f, "dates {}..={}", from, to),
        }
    }
}

/// A source the resolver can ask
#[async_trait]
pub trait SourceHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Match>>;

    /// False when `fetch` returns an unfiltered collection for `criteria`
    fn filters_server_side(&self, _criteria: &SearchCriteria) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub matches: Vec<Match>,
    pub used_source: String,
    /// True when the first handle did not answer
    pub fallback: bool,
}

pub async fn resolve(
    criteria: &SearchCriteria,
    handles: &[Arc<dyn SourceHandle>],
) -> EngineResult<Resolved> {
    let mut failures = Vec::new();

    for (index, handle) in handles.iter().enumerate() {
        match handle.fetch(criteria).await {
            Ok(mut matches) => {
                if !handle.filters_server_side(criteria) {
                    matches.retain(|game| criteria.matches(game));
                }
                if index > 0 {
                    info!(
                        "SEARCH: {} answered by fallback source {} after {} failure(s)",
                        criteria,
                        handle.name(),
                        failures.len()
                    );
                } else {
                    debug!("SEARCH: {} answered by {}", criteria, handle.name());
                }
                return Ok(Resolved {
                    matches,
                    used_source: handle.name().to_string(),
                    fallback: index > 0,
                });
            }
            Err(e) => {
                warn!("SEARCH: Source {} failed for {}: {:#}", handle.name(), criteria, e);
                failures.push(SourceError::from_anyhow(handle.name(), &e));
            }
        }
    }

    Err(EngineError::AggregateSearch(failures))
}

pub async fn resolve_by_date(
    date: NaiveDate,
    handles: &[Arc<dyn SourceHandle>],
) -> EngineResult<Resolved> {
    resolve(&SearchCriteria::ByDate(date), handles).await
}

pub async fn resolve_by_team(
    team: &str,
    handles: &[Arc<dyn SourceHandle>],
) -> EngineResult<Resolved> {
    resolve(&SearchCriteria::ByTeam(team.to_string()), handles).await
}

/// Kinds of handle the engine can build from its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Feed,
    Live,
    Store,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Live => "live",
            SourceKind::Store => "store",
        }
    }

    pub fn default_order() -> Vec<Self> {
        vec![SourceKind::Feed, SourceKind::Live, SourceKind::Store]
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feed" => Ok(SourceKind::Feed),
            "live" => Ok(SourceKind::Live),
            "store" | "local" => Ok(SourceKind::Store),
            other => Err(format!("unknown source '{}' (expected feed, live or store)", other)),
        }
    }
}

/// Feed search endpoints (by date, by team)
pub struct FeedHandle(pub Arc<dyn ExternalFeed>);

#[async_trait]
impl SourceHandle for FeedHandle {
    fn name(&self) -> &str {
        SourceKind::Feed.name()
    }

    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Match>> {
        match criteria {
            SearchCriteria::ByDate(date) => self.0.fetch_by_date(*date).await,
            SearchCriteria::ByTeam(name) => self.0.fetch_by_team(name).await,
            SearchCriteria::ByDateRange { .. } => {
                let mut matches = self.0.fetch_results_recent().await?;
                matches.extend(self.0.fetch_upcoming_matches().await?);
                Ok(matches)
            }
        }
    }

    fn filters_server_side(&self, criteria: &SearchCriteria) -> bool {
        !matches!(criteria, SearchCriteria::ByDateRange { .. })
    }
}

/// Feed's live list; it has no server-side filter at all
pub struct LiveFeedHandle(pub Arc<dyn ExternalFeed>);

#[async_trait]
impl SourceHandle for LiveFeedHandle {
    fn name(&self) -> &str {
        SourceKind::Live.name()
    }

    async fn fetch(&self, _criteria: &SearchCriteria) -> Result<Vec<Match>> {
        self.0.fetch_live_matches().await
    }

    fn filters_server_side(&self, _criteria: &SearchCriteria) -> bool {
        false
    }
}

pub struct StoreHandle(pub Arc<dyn LocalStore>);

#[async_trait]
impl SourceHandle for StoreHandle {
    fn name(&self) -> &str {
        SourceKind::Store.name()
    }

    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Match>> {
        match criteria {
            SearchCriteria::ByDate(date) => self.0.search_by_date_range(*date, *date).await,
            SearchCriteria::ByTeam(name) => self.0.search_by_team(name).await,
            SearchCriteria::ByDateRange { from, to } => self.0.search_by_date_range(*from, *to).await,
        }
    }
}
