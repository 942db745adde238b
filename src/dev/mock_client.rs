/// Mock live-score feed for development and testing
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::info;

use crate::data_provider::ExternalFeed;
use crate::fixtures;
use crate::types::{Match, TeamStanding};

/// Feed that serves fixture data instead of making real calls
pub struct MockFeed {
    matches: Mutex<Vec<Match>>,
    standings: Mutex<Vec<TeamStanding>>,
    failure: Mutex<Option<String>>,
    live_calls: AtomicUsize,
    standings_calls: AtomicUsize,
}

impl MockFeed {
    /// Create a mock feed loaded with the built-in fixtures
    pub fn new() -> Self {
        info!("Creating MockFeed for development mode");
        Self::with_data(fixtures::create_mock_matches(), fixtures::create_mock_standings())
    }

    pub fn with_data(matches: Vec<Match>, standings: Vec<TeamStanding>) -> Self {
        Self {
            matches: Mutex::new(matches),
            standings: Mutex::new(standings),
            failure: Mutex::new(None),
            live_calls: AtomicUsize::new(0),
            standings_calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call fail with `message`
    pub fn fail_with(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    pub fn set_matches(&self, matches: Vec<Match>) {
        *lock(&self.matches) = matches;
    }

    pub fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    pub fn standings_calls(&self) -> usize {
        self.standings_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        match lock(&self.failure).as_ref() {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    fn select(&self, keep: impl Fn(&Match) -> bool) -> Result<Vec<Match>> {
        self.check()?;
        Ok(lock(&self.matches).iter().filter(|m| keep(m)).cloned().collect())
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ExternalFeed for MockFeed {
    fn source_name(&self) -> &str {
        "mock-feed"
    }

    async fn fetch_live_matches(&self) -> Result<Vec<Match>> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        self.select(|m| m.is_live())
    }

    async fn fetch_upcoming_matches(&self) -> Result<Vec<Match>> {
        self.select(|m| !m.state().has_started())
    }

    async fn fetch_results_recent(&self) -> Result<Vec<Match>> {
        self.select(|m| m.is_finished())
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<Match>> {
        info!("MockFeed: Returning mock matches for date {}", date);
        self.select(|m| m.kickoff_date() == date)
    }

    async fn fetch_by_team(&self, name: &str) -> Result<Vec<Match>> {
        self.select(|m| m.involves_team(name))
    }

    async fn fetch_standings(&self, competition_id: &str) -> Result<Vec<TeamStanding>> {
        info!("MockFeed: Returning mock standings for {}", competition_id);
        self.standings_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(lock(&self.standings).clone())
    }
}
