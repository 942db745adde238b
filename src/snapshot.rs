/// JSON snapshot collaborators
///
/// `FileFeed` reads a feed dump (`{"matches": [...], "standings": [...]}`)
/// in the feed's loose shape and parses it into strict types, applying the
/// defaulting rules once. `FileStore` persists matches as a JSON array.
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::data_provider::{ExternalFeed, LocalStore};
use crate::types::{Match, Origin, Team, TeamId, TeamStanding, DEFAULT_VENUE};

/// Status assumed when the feed omits one
const DEFAULT_STATUS: &str = "NS";

/// Match as the feed sends it; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMatch {
    #[serde(alias = "id", alias = "code")]
    pub external_code: Option<Value>,
    pub local_id: Option<i64>,
    #[serde(alias = "home")]
    pub home_team: Option<String>,
    #[serde(alias = "away")]
    pub away_team: Option<String>,
    pub home_crest_url: Option<String>,
    pub away_crest_url: Option<String>,
    #[serde(alias = "date", alias = "kickoff")]
    pub kickoff_time: Option<String>,
    pub venue: Option<String>,
    pub status: Option<String>,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    #[serde(alias = "elapsed")]
    pub minute_elapsed: Option<u32>,
    pub section_id: Option<i64>,
}

impl RawMatch {
    /// Parse into a strict match. Feed rows (`Origin::External`) must carry a
    /// code; store rows may be local-only.
    pub fn into_match(self, origin: Origin) -> Result<Match> {
        let external_code = self.external_code.as_ref().map(value_to_code).unwrap_or_default();
        if origin == Origin::External && external_code.is_empty() {
            bail!(
                "feed match {} vs {} has no code",
                self.home_team.as_deref().unwrap_or("?"),
                self.away_team.as_deref().unwrap_or("?")
            );
        }
        let home_team = non_blank(self.home_team)
            .ok_or_else(|| anyhow!("match {:?} has no home team", external_code))?;
        let away_team = non_blank(self.away_team)
            .ok_or_else(|| anyhow!("match {:?} has no away team", external_code))?;
        let raw_kickoff = self
            .kickoff_time
            .ok_or_else(|| anyhow!("match {:?} has no kickoff time", external_code))?;
        let kickoff_time = parse_kickoff(&raw_kickoff)
            .with_context(|| format!("match {:?}", external_code))?;

        Ok(Match {
            external_code,
            local_id: self.local_id,
            home_team,
            away_team,
            home_crest_url: non_blank(self.home_crest_url),
            away_crest_url: non_blank(self.away_crest_url),
            kickoff_time,
            venue: non_blank(self.venue).unwrap_or_else(|| DEFAULT_VENUE.to_string()),
            status: non_blank(self.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            minute_elapsed: self.minute_elapsed,
            section_id: self.section_id,
            origin,
        })
    }
}

/// Standings row as the feed sends it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStanding {
    #[serde(alias = "id")]
    pub team_id: Option<Value>,
    #[serde(alias = "team", alias = "name")]
    pub team_name: Option<String>,
    #[serde(alias = "crest")]
    pub crest_url: Option<String>,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: Option<i32>,
    pub group: Option<String>,
    pub groups: Vec<String>,
}

impl RawStanding {
    pub fn into_standing(self) -> Result<TeamStanding> {
        let name = non_blank(self.team_name).ok_or_else(|| anyhow!("standing row has no team name"))?;
        let id = self
            .team_id
            .as_ref()
            .map(value_to_code)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| name.to_lowercase());
        let points = match self.points {
            Some(points) => points,
            None => derived_points(self.won, self.drawn, &name),
        };
        let mut group_membership: BTreeSet<String> = self.groups.into_iter().collect();
        if let Some(group) = non_blank(self.group) {
            group_membership.insert(group);
        }
        Ok(TeamStanding {
            team: Team {
                id: TeamId::new(id),
                name,
                crest_url: non_blank(self.crest_url),
            },
            played: self.played,
            won: self.won,
            drawn: self.drawn,
            lost: self.lost,
            goals_for: self.goals_for,
            goals_against: self.goals_against,
            points,
            group_membership,
        })
    }
}

/// Points from a win/draw record when the feed gives none; no deductions
/// are known. An out-of-range record yields zero.
fn derived_points(won: u32, drawn: u32, team: &str) -> i32 {
    won.checked_mul(3)
        .and_then(|w| w.checked_add(drawn))
        .and_then(|p| i32::try_from(p).ok())
        .unwrap_or_else(|| {
            warn!("SNAPSHOT: Points for {} out of range ({}W {}D), using 0", team, won, drawn);
            0
        })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedDump {
    matches: Vec<RawMatch>,
    standings: Vec<RawStanding>,
}

fn value_to_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// RFC 3339, or a naive "YYYY-MM-DD HH:MM[:SS]" taken as UTC
pub fn parse_kickoff(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    bail!("invalid kickoff time '{}'", raw)
}

/// Feed backed by a JSON dump; re-read on every call so edits show up live
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            bail!("feed snapshot {} does not exist", path.display());
        }
        Ok(Self { path })
    }

    async fn load(&self) -> Result<FeedDump> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read feed snapshot {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse feed snapshot {}", self.path.display()))
    }

    async fn matches(&self) -> Result<Vec<Match>> {
        let dump = self.load().await?;
        let total = dump.matches.len();
        let parsed: Vec<Match> = dump
            .matches
            .into_iter()
            .filter_map(|raw| match raw.into_match(Origin::External) {
                Ok(game) => Some(game),
                Err(e) => {
                    warn!("SNAPSHOT: Skipping unparseable match: {:#}", e);
                    None
                }
            })
            .collect();
        debug!("SNAPSHOT: Parsed {}/{} feed matches", parsed.len(), total);
        Ok(parsed)
    }

    async fn select(&self, keep: impl Fn(&Match) -> bool) -> Result<Vec<Match>> {
        Ok(self.matches().await?.into_iter().filter(|m| keep(m)).collect())
    }
}

#[async_trait]
impl ExternalFeed for FileFeed {
    async fn fetch_live_matches(&self) -> Result<Vec<Match>> {
        self.select(|m| m.is_live()).await
    }

    async fn fetch_upcoming_matches(&self) -> Result<Vec<Match>> {
        self.select(|m| !m.state().has_started()).await
    }

    async fn fetch_results_recent(&self) -> Result<Vec<Match>> {
        self.select(|m| m.is_finished()).await
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<Match>> {
        self.select(|m| m.kickoff_date() == date).await
    }

    async fn fetch_by_team(&self, name: &str) -> Result<Vec<Match>> {
        self.select(|m| m.involves_team(name)).await
    }

    async fn fetch_standings(&self, competition_id: &str) -> Result<Vec<TeamStanding>> {
        debug!("SNAPSHOT: Loading standings for {}", competition_id);
        self.load()
            .await?
            .standings
            .into_iter()
            .map(RawStanding::into_standing)
            .collect()
    }
}

/// Local store persisted as a JSON array of matches
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    /// A missing file is an empty store; it is created on first write
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Match>> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to check store {}", self.path.display()))?;
        if !exists {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read store {}", self.path.display()))?;
        let mut rows: Vec<Match> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store {}", self.path.display()))?;
        for row in &mut rows {
            row.origin = Origin::Local;
        }
        Ok(rows)
    }

    async fn save(&self, rows: &[Match]) -> Result<()> {
        let content = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write store {}", self.path.display()))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn list(&self) -> Result<Vec<Match>> {
        self.load().await
    }

    async fn create(&self, game: &Match, section_id: Option<i64>) -> Result<Match> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load().await?;
        if game.has_external_code() && rows.iter().any(|m| m.external_code == game.external_code) {
            bail!("match {} is already stored", game.external_code);
        }
        let next_id = rows.iter().filter_map(|m| m.local_id).max().unwrap_or(0) + 1;
        let stored = Match {
            local_id: Some(next_id),
            section_id,
            origin: Origin::Local,
            ..game.clone()
        };
        rows.push(stored.clone());
        self.save(&rows).await?;
        Ok(stored)
    }

    async fn update(&self, id: i64, game: &Match) -> Result<Match> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load().await?;
        let row = rows
            .iter_mut()
            .find(|m| m.local_id == Some(id))
            .ok_or_else(|| anyhow!("no local match with id {}", id))?;
        *row = Match {
            local_id: Some(id),
            origin: Origin::Local,
            ..game.clone()
        };
        let updated = row.clone();
        self.save(&rows).await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load().await?;
        let before = rows.len();
        rows.retain(|m| m.local_id != Some(id));
        if rows.len() == before {
            bail!("no local match with id {}", id);
        }
        self.save(&rows).await
    }

    async fn search_by_team(&self, name: &str) -> Result<Vec<Match>> {
        Ok(self.load().await?.into_iter().filter(|m| m.involves_team(name)).collect())
    }

    async fn search_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Match>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|m| (from..=to).contains(&m.kickoff_date()))
            .collect())
    }
}
