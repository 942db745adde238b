/// Traits for the engine's collaborators, abstracting over real clients and mocks
///
/// Transport is not the engine's concern: implementations hand back parsed
/// `Match`/`TeamStanding` values or an `anyhow::Error` describing what failed.
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{Match, TeamStanding};

/// Live-score feed
#[async_trait]
pub trait ExternalFeed: Send + Sync {
    /// Name used to tag errors coming from this feed
    fn source_name(&self) -> &str {
        "feed"
    }

    async fn fetch_live_matches(&self) -> Result<Vec<Match>>;

    async fn fetch_upcoming_matches(&self) -> Result<Vec<Match>>;

    async fn fetch_results_recent(&self) -> Result<Vec<Match>>;

    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<Match>>;

    async fn fetch_by_team(&self, name: &str) -> Result<Vec<Match>>;

    async fn fetch_standings(&self, competition_id: &str) -> Result<Vec<TeamStanding>>;
}

/// Locally persisted matches
#[async_trait]
pub trait LocalStore: Send + Sync {
    fn source_name(&self) -> &str {
        "store"
    }

    async fn list(&self) -> Result<Vec<Match>>;

    async fn create(&self, game: &Match, section_id: Option<i64>) -> Result<Match>;

    async fn update(&self, id: i64, game: &Match) -> Result<Match>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn search_by_team(&self, name: &str) -> Result<Vec<Match>>;

    async fn search_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Match>>;
}
