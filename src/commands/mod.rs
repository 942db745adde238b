pub mod live;
pub mod matches;
pub mod search;
pub mod standings;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};

use crate::search::SourceKind;
use crate::types::Match;

/// Parse optional date string, defaulting to today
///
/// Accepts dates in YYYY-MM-DD format.
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(date_str) => NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)),
        None => Ok(Local::now().date_naive()),
    }
}

/// Parse a comma separated source list such as "feed,live,store"
pub fn parse_order(order: &str) -> Result<Vec<SourceKind>> {
    let kinds = order
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SourceKind>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    if kinds.is_empty() {
        bail!("Source order '{}' names no sources", order);
    }
    Ok(kinds)
}

/// One line per match: kickoff, teams, score and the state label
pub fn format_match_line(game: &Match, time_format: &str) -> String {
    let state = game.state();
    let mut label = state.display_label(&game.status);
    if let (true, Some(minute)) = (state.is_live(), game.minute_elapsed) {
        label = format!("{} {}'", label, minute);
    }
    format!(
        "{}  {} {:^5} {}  [{}] {}",
        game.kickoff_time.format(time_format),
        crate::formatting::pad_to_width(&game.home_team, TEAM_COL_WIDTH),
        game.score_line(),
        crate::formatting::pad_to_width(&game.away_team, TEAM_COL_WIDTH),
        state.emphasis_tag().as_str(),
        label,
    )
    .trim_end()
    .to_string()
}

/// Width of each team name in match lines
const TEAM_COL_WIDTH: usize = 24;
