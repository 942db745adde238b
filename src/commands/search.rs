use anyhow::{Context, Result};

use crate::commands::{format_match_line, parse_date, parse_order};
use crate::config::Config;
use crate::engine::Engine;
use crate::formatting::format_header;
use crate::search::{Resolved, SearchCriteria};

/// A team name wins over a date; with neither, search today's matches
pub fn build_criteria(date: Option<&str>, team: Option<&str>) -> Result<SearchCriteria> {
    match team.map(str::trim).filter(|t| !t.is_empty()) {
        Some(team) => Ok(SearchCriteria::ByTeam(team.to_string())),
        None => Ok(SearchCriteria::ByDate(parse_date(date)?)),
    }
}

pub fn format_resolved(criteria: &SearchCriteria, resolved: &Resolved, config: &Config) -> String {
    let mut title = format!("Matches for {} (from {}", criteria, resolved.used_source);
    if resolved.fallback {
        title.push_str(", fallback");
    }
    title.push(')');

    let mut output = format_header(&title, true, &config.display);
    if resolved.matches.is_empty() {
        output.push_str("No matches found.\n");
    }
    for game in &resolved.matches {
        output.push_str(&format_match_line(game, &config.time_format));
        output.push('\n');
    }
    output
}

pub async fn run(
    engine: &Engine,
    date: Option<String>,
    team: Option<String>,
    order: Option<String>,
    config: &Config,
) -> Result<()> {
    let criteria = build_criteria(date.as_deref(), team.as_deref())?;
    let order = match order {
        Some(order) => parse_order(&order)?,
        None => config.sources.search_order.clone(),
    };

    let resolved = engine
        .search(&criteria, &order)
        .await
        .with_context(|| format!("Search by {} failed", criteria))?;
    print!("{}", format_resolved(&criteria, &resolved, config));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::feed_match;
    use chrono::NaiveDate;

    #[test]
    fn test_build_criteria_prefers_team() {
        let criteria = build_criteria(Some("2024-11-20"), Some(" Junior ")).unwrap();
        assert_eq!(criteria, SearchCriteria::ByTeam("Junior".into()));
    }

    #[test]
    fn test_build_criteria_date() {
        let criteria = build_criteria(Some("2024-11-20"), None).unwrap();
        assert_eq!(
            criteria,
            SearchCriteria::ByDate(NaiveDate::from_ymd_opt(2024, 11, 20).unwrap())
        );
        assert!(build_criteria(Some("yesterday"), None).is_err());
    }

    #[test]
    fn test_format_resolved_marks_fallback() {
        let resolved = Resolved {
            matches: vec![feed_match("A", "FT", Some((2, 1)))],
            used_source: "store".into(),
            fallback: true,
        };
        let criteria = SearchCriteria::ByTeam("Home".into());
        let output = format_resolved(&criteria, &resolved, &Config::default());
        assert!(output.starts_with("Matches for team 'Home' (from store, fallback)\n"));
        assert!(output.contains(" 2-1 "));
    }
}
