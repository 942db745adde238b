/// In-memory local store for development and testing
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::data_provider::LocalStore;
use crate::types::{Match, Origin};

#[derive(Default)]
struct Inner {
    rows: Vec<Match>,
    next_id: i64,
    failure: Option<String>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    create_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<Match>) -> Self {
        let next_id = rows.iter().filter_map(|m| m.local_id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner { rows, next_id, failure: None }),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.lock().failure = Some(message.to_string());
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rows(&self) -> Result<Vec<Match>> {
        let inner = self.lock();
        if let Some(message) = &inner.failure {
            bail!("{}", message);
        }
        Ok(inner.rows.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    fn source_name(&self) -> &str {
        "memory-store"
    }

    async fn list(&self) -> Result<Vec<Match>> {
        self.rows()
    }

    async fn create(&self, game: &Match, section_id: Option<i64>) -> Result<Match> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        if let Some(message) = &inner.failure {
            bail!("{}", message);
        }
        let mut stored = game.clone();
        stored.local_id = Some(inner.next_id);
        stored.section_id = section_id;
        stored.origin = Origin::Local;
        inner.next_id += 1;
        inner.rows.push(stored.clone());
        debug!("MemoryStore: Created local id {:?}", stored.local_id);
        Ok(stored)
    }

    async fn update(&self, id: i64, game: &Match) -> Result<Match> {
        let mut inner = self.lock();
        let row = inner
            .rows
            .iter_mut()
            .find(|m| m.local_id == Some(id))
            .ok_or_else(|| anyhow!("no local match with id {}", id))?;
        *row = Match {
            local_id: Some(id),
            origin: Origin::Local,
            ..game.clone()
        };
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.lock();
        let before = inner.rows.len();
        inner.rows.retain(|m| m.local_id != Some(id));
        if inner.rows.len() == before {
            bail!("no local match with id {}", id);
        }
        Ok(())
    }

    async fn search_by_team(&self, name: &str) -> Result<Vec<Match>> {
        Ok(self.rows()?.into_iter().filter(|m| m.involves_team(name)).collect())
    }

    async fn search_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Match>> {
        Ok(self
            .rows()?
            .into_iter()
            .filter(|m| (from..=to).contains(&m.kickoff_date()))
            .collect())
    }
}
