use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::commands::format_match_line;
use crate::config::Config;
use crate::engine::Engine;
use crate::formatting::format_header;
use crate::types::{Match, Origin};

/// Unified view grouped by kickoff date; stored matches are flagged with `*`
pub fn format_matches(matches: &[Match], config: &Config) -> String {
    if matches.is_empty() {
        return "No matches.\n".to_string();
    }

    let mut by_date: BTreeMap<_, Vec<&Match>> = BTreeMap::new();
    for game in matches {
        by_date.entry(game.kickoff_date()).or_default().push(game);
    }

    let mut output = String::new();
    for (date, games) in by_date {
        output.push_str(&format_header(
            &date.format("%A %Y-%m-%d").to_string(),
            true,
            &config.display,
        ));
        for game in games {
            let marker = if game.origin == Origin::Local { '*' } else { ' ' };
            output.push_str(&format!(
                "{} {}\n",
                marker,
                format_match_line(game, &config.time_format)
            ));
        }
        output.push('\n');
    }
    output
}

pub async fn run(engine: &Engine, config: &Config) -> Result<()> {
    let matches = engine
        .get_unified_matches()
        .await
        .context("Failed to fetch matches")?;
    print!("{}", format_matches(&matches, config));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_mock_matches, local_match};

    #[test]
    fn test_format_matches_empty() {
        assert_eq!(format_matches(&[], &Config::default()), "No matches.\n");
    }

    #[test]
    fn test_format_matches_groups_by_date() {
        let mut matches = create_mock_matches();
        matches.push(local_match(2, "", "NS", Some(5)));
        let output = format_matches(&matches, &Config::default());

        assert!(output.starts_with("Wednesday 2024-11-20\n"));
        assert!(output.contains("Millonarios"));
        assert_eq!(output.lines().filter(|l| l.starts_with('*')).count(), 1);
    }
}
