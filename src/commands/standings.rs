use crate::config::{Config, DisplayConfig};
use crate::engine::Engine;
use crate::formatting::{format_header, pad_to_width};
use crate::standings::{StandingsResult, StandingsTable};
use anyhow::{bail, Context, Result};

// Layout Constants
/// Width of standings table column (for two-column layout)
const STANDINGS_COLUMN_WIDTH: usize = 62;

/// Width of position column
const POS_COL_WIDTH: usize = 3;

/// Width of team name column
const TEAM_NAME_COL_WIDTH: usize = 22;

/// Width of played/won/drawn/lost columns
const COUNT_COL_WIDTH: usize = 3;

/// Width of goal difference column
const GD_COL_WIDTH: usize = 4;

/// Width of points column
const PTS_COL_WIDTH: usize = 4;

/// Width of zone column
const ZONE_COL_WIDTH: usize = 14;

/// Spacing between columns in two-column layout
const COLUMN_SPACING: usize = 4;

/// Render one ranked table; a rule separates consecutive zones
pub fn format_standings_table(table: &StandingsTable, display: &DisplayConfig) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:>pos$} {} {:>n$} {:>n$} {:>n$} {:>n$} {:>gd$} {:>pts$}  {}\n",
        "#",
        pad_to_width("Team", TEAM_NAME_COL_WIDTH),
        "GP",
        "W",
        "D",
        "L",
        "GD",
        "PTS",
        "Zone",
        pos = POS_COL_WIDTH,
        n = COUNT_COL_WIDTH,
        gd = GD_COL_WIDTH,
        pts = PTS_COL_WIDTH,
    ));
    output.push_str(&format!(
        "{}\n",
        display.box_chars.horizontal.repeat(STANDINGS_COLUMN_WIDTH)
    ));

    let mut previous_zone: Option<&Option<String>> = None;
    for entry in &table.entries {
        if previous_zone.is_some_and(|zone| zone != &entry.zone) {
            output.push_str(&format!(
                "{}\n",
                display.box_chars.horizontal.repeat(STANDINGS_COLUMN_WIDTH)
            ));
        }
        previous_zone = Some(&entry.zone);

        let standing = &entry.standing;
        let line = format!(
            "{:>pos$} {} {:>n$} {:>n$} {:>n$} {:>n$} {:>+gd$} {:>pts$}  {}",
            entry.position,
            pad_to_width(&standing.team.name, TEAM_NAME_COL_WIDTH),
            standing.played,
            standing.won,
            standing.drawn,
            standing.lost,
            standing.goal_difference(),
            standing.points,
            pad_to_width(entry.zone.as_deref().unwrap_or(""), ZONE_COL_WIDTH),
            pos = POS_COL_WIDTH,
            n = COUNT_COL_WIDTH,
            gd = GD_COL_WIDTH,
            pts = PTS_COL_WIDTH,
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

fn format_group_with_header(table: &StandingsTable, display: &DisplayConfig) -> Vec<String> {
    let mut lines = Vec::new();
    let header = format_header(&table.label, true, display);
    lines.extend(header.lines().map(|s| s.to_string()));
    lines.push(String::new()); // Empty line between header and table

    let rows = format_standings_table(table, display);
    lines.extend(rows.lines().map(|s| s.to_string()));

    lines
}

fn merge_columns(left_lines: Vec<String>, right_lines: Vec<String>, column_width: usize) -> String {
    let mut output = String::new();
    let max_len = left_lines.len().max(right_lines.len());

    for i in 0..max_len {
        let left = left_lines.get(i).map(|s| s.as_str()).unwrap_or("");
        let right = right_lines.get(i).map(|s| s.as_str()).unwrap_or("");

        let line = format!(
            "{}{}{}",
            pad_to_width(left, column_width),
            " ".repeat(COLUMN_SPACING),
            right,
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Overall table first, then group tables side by side in pairs
pub fn format_standings(result: &StandingsResult, display: &DisplayConfig) -> String {
    if result.overall.is_empty() {
        return "No standings available.\n".to_string();
    }

    let mut output = String::new();
    output.push('\n');
    output.push_str(&format_header(&result.overall.label, true, display));
    output.push('\n');
    output.push_str(&format_standings_table(&result.overall, display));

    let groups: Vec<&StandingsTable> = result.groups.values().collect();
    for pair in groups.chunks(2) {
        output.push('\n');
        let left = format_group_with_header(pair[0], display);
        let right = pair
            .get(1)
            .map(|table| format_group_with_header(table, display))
            .unwrap_or_default();
        output.push_str(&merge_columns(left, right, STANDINGS_COLUMN_WIDTH));
    }

    output
}

/// Render a single group's table by name
pub fn format_group(result: &StandingsResult, group: &str, display: &DisplayConfig) -> Result<String> {
    match result.groups.get(group) {
        Some(table) => {
            let mut output = String::from("\n");
            output.push_str(&format_group_with_header(table, display).join("\n"));
            output.push('\n');
            Ok(output)
        }
        None => {
            let known: Vec<&str> = result.groups.keys().map(String::as_str).collect();
            bail!("Unknown group '{}'. Known groups: {}", group, known.join(", "))
        }
    }
}

pub async fn run(engine: &Engine, group: Option<String>, config: &Config) -> Result<()> {
    let result = engine
        .get_standings()
        .await
        .context("Failed to fetch standings")?;

    let output = match group {
        Some(name) => format_group(&result, &name, &config.display)?,
        None => format_standings(&result, &config.display),
    };
    print!("{}", output);

    Ok(())
}
