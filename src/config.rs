use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use xdg::BaseDirectories;

use crate::formatting::BoxChars;
use crate::search::SourceKind;
use crate::standings::{GroupDefinition, ZoneBoundary};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub log_file: String,
    /// Seconds between live polls
    pub refresh_interval: u32,
    pub time_format: String,
    pub display: DisplayConfig,
    pub competition: CompetitionConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub use_unicode: bool,
    #[serde(skip)]
    pub box_chars: BoxChars,
}

/// Competition-specific table rules
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CompetitionConfig {
    pub id: String,
    pub label: String,
    pub overall_zones: Vec<ZoneBoundary>,
    pub group_zones: Vec<ZoneBoundary>,
    pub groups: Vec<GroupDefinition>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub search_order: Vec<SourceKind>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            log_file: "/dev/null".to_string(),
            refresh_interval: 60,
            time_format: "%H:%M".to_string(),
            display: DisplayConfig::default(),
            competition: CompetitionConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            use_unicode: true,
            box_chars: BoxChars::unicode(),
        }
    }
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        CompetitionConfig {
            id: "primera-a".to_string(),
            label: "Liga Primera A".to_string(),
            overall_zones: vec![
                ZoneBoundary::new(8, "cuadrangulares"),
                ZoneBoundary::rest("eliminated"),
            ],
            group_zones: vec![
                ZoneBoundary::new(1, "final"),
                ZoneBoundary::rest("eliminated"),
            ],
            groups: vec![
                GroupDefinition::new("cuadrangular-a", Vec::<crate::types::TeamId>::new()),
                GroupDefinition::new("cuadrangular-b", Vec::<crate::types::TeamId>::new()),
            ],
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            search_order: SourceKind::default_order(),
        }
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    let pgm = env!("CARGO_PKG_NAME");
    let xdg_dirs = BaseDirectories::with_prefix(pgm);
    let config_home = xdg_dirs.get_config_home()?;
    Some(config_home.join("config.toml"))
}

/// Parse a config file's contents; box characters follow `use_unicode`
pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    let mut config: Config = toml::from_str(content)?;
    config.display.box_chars = BoxChars::from_use_unicode(config.display.use_unicode);
    Ok(config)
}

pub fn read() -> Config {
    let config_path = match get_config_path() {
        Some(path) => path,
        None => return Config::default(),
    };

    // Check if file exists
    if !config_path.exists() {
        return Config::default();
    }

    let content = match fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };

    parse(&content).unwrap_or_else(|e| {
        warn!("Ignoring invalid config {}: {}", config_path.display(), e);
        Config::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::RankBound;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.refresh_interval, 60);
        assert_eq!(config.display.box_chars, BoxChars::unicode());
        assert_eq!(config.sources.search_order.len(), 3);
        assert_eq!(config.competition.groups.len(), 2);
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let config = parse("refresh_interval = 15\n").unwrap();
        assert_eq!(config.refresh_interval, 15);
        assert_eq!(config.log_file, "/dev/null");
        assert_eq!(config.competition, CompetitionConfig::default());
    }

    #[test]
    fn test_config_ascii_display() {
        let config = parse("[display]\nuse_unicode = false\n").unwrap();
        assert_eq!(config.display.box_chars, BoxChars::ascii());
    }

    #[test]
    fn test_config_from_toml_competition() {
        let toml_str = r#"
log_level = "debug"

[competition]
id = "liga-betplay-2024-ii"
label = "Liga BetPlay 2024-II"
overall_zones = [
    { upto = 4, zone = "continental-a" },
    { upto = 8, zone = "continental-b" },
    { upto = 12, zone = "continental-c" },
    { zone = "relegation" },
]
group_zones = [{ upto = 2, zone = "qualified" }, { upto = 4, zone = "eliminated" }]

[[competition.groups]]
name = "cuadrangular-a"
team_ids = ["jun", "tol", "sfe", "med"]

[[competition.groups]]
name = "cuadrangular-b"
team_ids = ["nac", "mil", "amer", "buc"]
zones = [{ upto = 1, zone = "final" }]

[sources]
search_order = ["store", "feed"]
        "#;

        let config = parse(toml_str).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.competition.id, "liga-betplay-2024-ii");
        assert_eq!(config.competition.overall_zones.len(), 4);
        assert_eq!(config.competition.overall_zones[3].upto, RankBound::Unbounded);
        assert_eq!(config.competition.groups[0].team_ids.len(), 4);
        assert_eq!(config.competition.groups[1].zones.len(), 1);
        assert_eq!(
            config.sources.search_order,
            vec![SourceKind::Store, SourceKind::Feed]
        );
    }

    #[test]
    fn test_config_rejects_unknown_source() {
        assert!(parse("[sources]\nsearch_order = [\"cloud\"]\n").is_err());
    }
}
