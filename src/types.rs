/// Shared types used across the engine
///
/// These are the strict shapes every collaborator payload is parsed into.
/// Defaulting (venue, missing crests) happens once at the boundary, so the
/// rest of the crate never has to guess.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::match_state::{self, MatchState};

/// Venue used when the feed does not announce one
pub const DEFAULT_VENUE: &str = "to be confirmed";

/// Where a match record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    External,
    Local,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::External => write!(f, "EXTERNAL"),
            Origin::Local => write!(f, "LOCAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub external_code: String,
    pub local_id: Option<i64>,
    pub home_team: String,
    pub away_team: String,
    pub home_crest_url: Option<String>,
    pub away_crest_url: Option<String>,
    pub kickoff_time: DateTime<Utc>,
    pub venue: String,
    pub status: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub minute_elapsed: Option<u32>,
    pub section_id: Option<i64>,
    pub origin: Origin,
}

impl Match {
    /// Create a feed match with no score yet
    pub fn new(
        external_code: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        kickoff_time: DateTime<Utc>,
    ) -> Self {
        Self {
            external_code: external_code.into(),
            local_id: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_crest_url: None,
            away_crest_url: None,
            kickoff_time,
            venue: DEFAULT_VENUE.to_string(),
            status: "NS".to_string(),
            home_goals: None,
            away_goals: None,
            minute_elapsed: None,
            section_id: None,
            origin: Origin::External,
        }
    }

    pub fn state(&self) -> MatchState {
        match_state::classify(&self.status)
    }

    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    pub fn has_external_code(&self) -> bool {
        !self.external_code.trim().is_empty()
    }

    pub fn kickoff_date(&self) -> NaiveDate {
        self.kickoff_time.date_naive()
    }

    /// Case-insensitive substring match against either side
    pub fn involves_team(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.home_team.to_lowercase().contains(&needle)
            || self.away_team.to_lowercase().contains(&needle)
    }

    /// Score as "2-1", or "-" before kickoff
    pub fn score_line(&self) -> String {
        match (self.home_goals, self.away_goals) {
            (Some(h), Some(a)) => format!("{}-{}", h, a),
            _ => "-".to_string(),
        }
    }
}

/// Stable team identifier from the feed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub crest_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team: Team,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Authoritative; feeds may apply deductions so this is not always 3W+D
    pub points: i32,
    #[serde(default)]
    pub group_membership: BTreeSet<String>,
}

impl TeamStanding {
    pub fn goal_difference(&self) -> i32 {
        self.goals_for as i32 - self.goals_against as i32
    }

    pub fn belongs_to(&self, group: &str) -> bool {
        self.group_membership.contains(group)
    }
}
