/// Standings aggregation: one overall table plus independently ranked groups
///
/// Every table is sorted by points, goal difference, goals scored, then team
/// name, and each position is tagged with the first zone whose upper bound
/// covers it. Positions are 1-based.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::types::{TeamId, TeamStanding};

/// Label of the league-wide table
pub const OVERALL_LABEL: &str = "Overall";

/// Inclusive upper position of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum RankBound {
    At(usize),
    Unbounded,
}

impl RankBound {
    pub fn covers(&self, position: usize) -> bool {
        match self {
            RankBound::At(upper) => position <= *upper,
            RankBound::Unbounded => true,
        }
    }
}

impl From<Option<usize>> for RankBound {
    fn from(value: Option<usize>) -> Self {
        value.map(RankBound::At).unwrap_or(RankBound::Unbounded)
    }
}

impl From<RankBound> for Option<usize> {
    fn from(value: RankBound) -> Self {
        match value {
            RankBound::At(upper) => Some(upper),
            RankBound::Unbounded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBoundary {
    /// Omitted in config means "every remaining position"
    #[serde(default = "unbounded")]
    pub upto: RankBound,
    pub zone: String,
}

fn unbounded() -> RankBound {
    RankBound::Unbounded
}

impl ZoneBoundary {
    pub fn new(upto: usize, zone: &str) -> Self {
        Self { upto: RankBound::At(upto), zone: zone.to_string() }
    }

    pub fn rest(zone: &str) -> Self {
        Self { upto: RankBound::Unbounded, zone: zone.to_string() }
    }
}

/// A named subset of teams ranked on its own (e.g. a cuadrangular)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    #[serde(default)]
    pub team_ids: BTreeSet<TeamId>,
    /// Overrides the shared group zones when non-empty
    #[serde(default)]
    pub zones: Vec<ZoneBoundary>,
}

impl GroupDefinition {
    pub fn new<I, T>(name: &str, team_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TeamId>,
    {
        Self {
            name: name.to_string(),
            team_ids: team_ids.into_iter().map(Into::into).collect(),
            zones: Vec::new(),
        }
    }

    fn includes(&self, standing: &TeamStanding) -> bool {
        self.team_ids.contains(&standing.team.id) || standing.belongs_to(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub position: usize,
    pub standing: TeamStanding,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsTable {
    pub label: String,
    pub entries: Vec<RankedEntry>,
    pub zone_boundaries: Vec<ZoneBoundary>,
}

impl StandingsTable {
    /// Sort and zone `rows`; boundaries must already be validated
    fn build(label: &str, mut rows: Vec<TeamStanding>, zones: &[ZoneBoundary]) -> Self {
        rows.sort_by(compare_standings);
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(index, standing)| {
                let position = index + 1;
                RankedEntry {
                    position,
                    zone: zone_for(position, zones),
                    standing,
                }
            })
            .collect();
        Self {
            label: label.to_string(),
            entries,
            zone_boundaries: zones.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position_of(&self, team: &TeamId) -> Option<usize> {
        self.entry(team).map(|e| e.position)
    }

    pub fn zone_of(&self, team: &TeamId) -> Option<&str> {
        self.entry(team).and_then(|e| e.zone.as_deref())
    }

    fn entry(&self, team: &TeamId) -> Option<&RankedEntry> {
        self.entries.iter().find(|e| &e.standing.team.id == team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsResult {
    pub overall: StandingsTable,
    pub groups: BTreeMap<String, StandingsTable>,
}

/// Table order: points, goal difference, goals for (all descending), then
/// team name ascending. Falls back to exact name and id so equal inputs
/// always produce the same order.
pub fn compare_standings(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team.name.to_lowercase().cmp(&b.team.name.to_lowercase()))
        .then_with(|| a.team.name.cmp(&b.team.name))
        .then_with(|| a.team.id.cmp(&b.team.id))
}

fn zone_for(position: usize, zones: &[ZoneBoundary]) -> Option<String> {
    zones
        .iter()
        .find(|boundary| boundary.upto.covers(position))
        .map(|boundary| boundary.zone.clone())
}

/// Boundaries must be strictly ascending and start at position 1 or later
pub fn validate_boundaries(label: &str, zones: &[ZoneBoundary]) -> EngineResult<()> {
    if let Some(first) = zones.first() {
        if first.upto == RankBound::At(0) {
            return Err(EngineError::Configuration(format!(
                "{}: zone '{}' ends at position 0; positions start at 1",
                label, first.zone
            )));
        }
    }
    for pair in zones.windows(2) {
        if pair[0].upto >= pair[1].upto {
            return Err(EngineError::Configuration(format!(
                "{}: zone boundaries must be ascending, but '{}' ({}) is followed by '{}' ({})",
                label,
                pair[0].zone,
                describe(pair[0].upto),
                pair[1].zone,
                describe(pair[1].upto)
            )));
        }
    }
    Ok(())
}

fn describe(bound: RankBound) -> String {
    match bound {
        RankBound::At(upper) => upper.to_string(),
        RankBound::Unbounded => "∞".to_string(),
    }
}

/// Build the overall table and one table per group.
///
/// All configuration is checked before any table is built, so a bad
/// boundary list yields an error and no partial result. Teams named by a
/// group but missing from `raw` are skipped.
pub fn aggregate(
    raw: &[TeamStanding],
    groups: &[GroupDefinition],
    overall_zones: &[ZoneBoundary],
    group_zones: &[ZoneBoundary],
) -> EngineResult<StandingsResult> {
    validate_boundaries(OVERALL_LABEL, overall_zones)?;
    validate_boundaries("groups", group_zones)?;
    let mut names = HashSet::new();
    for group in groups {
        if !names.insert(group.name.as_str()) {
            return Err(EngineError::Configuration(format!(
                "group '{}' is defined more than once",
                group.name
            )));
        }
        validate_boundaries(&group.name, &group.zones)?;
    }

    let rows = dedupe(raw);
    let overall = StandingsTable::build(OVERALL_LABEL, rows.clone(), overall_zones);

    let mut tables = BTreeMap::new();
    for group in groups {
        let members: Vec<TeamStanding> = rows.iter().filter(|s| group.includes(s)).cloned().collect();
        let missing = group
            .team_ids
            .iter()
            .filter(|id| !rows.iter().any(|s| &s.team.id == *id))
            .count();
        if missing > 0 {
            debug!("STANDINGS: {} team(s) of group {} not in standings", missing, group.name);
        }
        let zones = if group.zones.is_empty() { group_zones } else { group.zones.as_slice() };
        tables.insert(group.name.clone(), StandingsTable::build(&group.name, members, zones));
    }

    debug!(
        "STANDINGS: Aggregated {} teams into overall + {} groups",
        overall.len(),
        tables.len()
    );
    Ok(StandingsResult { overall, groups: tables })
}

fn dedupe(raw: &[TeamStanding]) -> Vec<TeamStanding> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|s| {
            let fresh = seen.insert(&s.team.id);
            if !fresh {
                warn!("STANDINGS: Ignoring duplicate row for team {}", s.team.id);
            }
            fresh
        })
        .cloned()
        .collect()
}

/// Competition-bound aggregator; validates its configuration once
#[derive(Debug, Clone)]
pub struct Aggregator {
    groups: Vec<GroupDefinition>,
    overall_zones: Vec<ZoneBoundary>,
    group_zones: Vec<ZoneBoundary>,
}

impl Aggregator {
    pub fn new(
        groups: Vec<GroupDefinition>,
        overall_zones: Vec<ZoneBoundary>,
        group_zones: Vec<ZoneBoundary>,
    ) -> EngineResult<Self> {
        // Dry run on no data surfaces configuration errors up front
        aggregate(&[], &groups, &overall_zones, &group_zones)?;
        Ok(Self { groups, overall_zones, group_zones })
    }

    pub fn aggregate(&self, raw: &[TeamStanding]) -> EngineResult<StandingsResult> {
        aggregate(raw, &self.groups, &self.overall_zones, &self.group_zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_mock_standings, standing};
    use proptest::prelude::*;

    fn ids(table: &StandingsTable) -> Vec<&str> {
        table.entries.iter().map(|e| e.standing.team.id.as_str()).collect()
    }

    #[test]
    fn test_sort_tie_break_chain() {
        let raw = vec![
            standing("d", "Delta", 10, 5, 5, &[]),
            standing("c", "Charlie", 10, 8, 6, &[]),
            standing("b", "bravo", 10, 6, 4, &[]),
            standing("a", "Alpha", 10, 6, 4, &[]),
            standing("e", "Echo", 12, 0, 9, &[]),
        ];

        let result = aggregate(&raw, &[], &[], &[]).unwrap();

        // e: most points; c/b/a share GD 2, c scored more; a/b by name
        assert_eq!(ids(&result.overall), vec!["e", "c", "a", "b", "d"]);
        assert_eq!(result.overall.entries[0].position, 1);
    }

    #[test]
    fn test_empty_input_gives_empty_overall() {
        let result = aggregate(&[], &[], &[ZoneBoundary::rest("none")], &[]).unwrap();
        assert!(result.overall.is_empty());
        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_eighteen_team_continental_boundary() {
        let raw = create_mock_standings();
        let zones = vec![ZoneBoundary::new(4, "continental"), ZoneBoundary::rest("none")];

        let result = aggregate(&raw, &[], &zones, &[]).unwrap();

        assert_eq!(result.overall.len(), 18);
        assert_eq!(result.overall.entries[3].zone.as_deref(), Some("continental"));
        assert_eq!(result.overall.entries[4].zone.as_deref(), Some("none"));
        assert_eq!(result.overall.entries[17].zone.as_deref(), Some("none"));
    }

    #[test]
    fn test_positions_past_last_bounded_zone_have_no_zone() {
        let raw = create_mock_standings();
        let zones = vec![ZoneBoundary::new(8, "playoffs")];

        let result = aggregate(&raw, &[], &zones, &[]).unwrap();

        assert_eq!(result.overall.entries[7].zone.as_deref(), Some("playoffs"));
        assert_eq!(result.overall.entries[8].zone, None);
    }

    #[test]
    fn test_descending_boundaries_rejected_without_partial_result() {
        let raw = create_mock_standings();
        let zones = vec![ZoneBoundary::new(4, "eliminated"), ZoneBoundary::new(2, "qualified")];

        let err = aggregate(&raw, &[], &zones, &[]).unwrap_err();

        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_unbounded_must_be_last() {
        let zones = vec![ZoneBoundary::rest("none"), ZoneBoundary::new(4, "continental")];
        assert!(validate_boundaries("t", &zones).is_err());
    }

    #[test]
    fn test_equal_boundaries_rejected() {
        let zones = vec![ZoneBoundary::new(4, "a"), ZoneBoundary::new(4, "b")];
        assert!(validate_boundaries("t", &zones).is_err());
    }

    #[test]
    fn test_zero_boundary_rejected() {
        let zones = vec![ZoneBoundary::new(0, "nobody")];
        assert!(validate_boundaries("t", &zones).is_err());
    }

    #[test]
    fn test_bad_group_zones_rejected() {
        let mut group = GroupDefinition::new("cuadrangular-a", ["jun"]);
        group.zones = vec![ZoneBoundary::new(3, "x"), ZoneBoundary::new(1, "y")];
        let err = aggregate(&create_mock_standings(), &[group], &[], &[]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let groups = vec![
            GroupDefinition::new("a", ["jun"]),
            GroupDefinition::new("a", ["nac"]),
        ];
        assert!(aggregate(&[], &groups, &[], &[]).is_err());
    }

    #[test]
    fn test_group_ranks_independent_of_overall() {
        let raw = create_mock_standings();
        let group = GroupDefinition::new("cuadrangular-a", ["jun", "tol", "sfe", "med"]);
        let zones = vec![ZoneBoundary::new(1, "final"), ZoneBoundary::rest("eliminated")];

        let result = aggregate(&raw, &[group], &[], &zones).unwrap();
        let table = &result.groups["cuadrangular-a"];

        assert_eq!(ids(table), vec!["tol", "jun", "sfe", "med"]);
        assert_eq!(table.zone_of(&TeamId::new("tol")), Some("final"));
        assert_eq!(table.zone_of(&TeamId::new("med")), Some("eliminated"));
        assert_eq!(result.overall.position_of(&TeamId::new("tol")), Some(2));
        assert_eq!(table.position_of(&TeamId::new("tol")), Some(1));
    }

    #[test]
    fn test_group_skips_unknown_team() {
        let raw = create_mock_standings();
        let group = GroupDefinition::new("cuadrangular-x", ["jun", "ghost"]);

        let result = aggregate(&raw, &[group], &[], &[]).unwrap();

        assert_eq!(ids(&result.groups["cuadrangular-x"]), vec!["jun"]);
    }

    #[test]
    fn test_group_membership_from_feed() {
        let raw = create_mock_standings();
        let group = GroupDefinition::new("cuadrangular-b", Vec::<TeamId>::new());

        let result = aggregate(&raw, &[group], &[], &[]).unwrap();

        assert_eq!(ids(&result.groups["cuadrangular-b"]), vec!["nac", "mil", "amer", "buc"]);
    }

    #[test]
    fn test_team_in_several_groups() {
        let raw = create_mock_standings();
        let groups = vec![
            GroupDefinition::new("g1", ["nac", "jun"]),
            GroupDefinition::new("g2", ["jun", "chi"]),
        ];

        let result = aggregate(&raw, &groups, &[], &[]).unwrap();

        assert_eq!(result.groups["g1"].position_of(&TeamId::new("jun")), Some(2));
        assert_eq!(result.groups["g2"].position_of(&TeamId::new("jun")), Some(1));
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let raw = vec![
            standing("a", "Alpha", 10, 1, 1, &[]),
            standing("a", "Alpha", 30, 1, 1, &[]),
        ];
        let result = aggregate(&raw, &[], &[], &[]).unwrap();
        assert_eq!(result.overall.len(), 1);
        assert_eq!(result.overall.entries[0].standing.points, 10);
    }

    #[test]
    fn test_aggregator_validates_on_construction() {
        let bad = vec![ZoneBoundary::rest("none"), ZoneBoundary::new(2, "top")];
        assert!(Aggregator::new(Vec::new(), bad, Vec::new()).is_err());
    }

    #[test]
    fn test_zone_boundaries_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            zones: Vec<ZoneBoundary>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
zones = [
    { upto = 4, zone = "continental-a" },
    { zone = "relegation" },
]
"#,
        )
        .unwrap();
        assert_eq!(
            parsed.zones,
            vec![ZoneBoundary::new(4, "continental-a"), ZoneBoundary::rest("relegation")]
        );
    }

    fn arb_standings() -> impl Strategy<Value = Vec<TeamStanding>> {
        // Narrow ranges force ties at every level of the chain
        prop::collection::vec((0i32..4, 0u32..3, 0u32..3, 0usize..4), 1..20).prop_map(|rows| {
            let names = ["Alpha", "alpha", "Bravo", "Charlie"];
            rows.into_iter()
                .enumerate()
                .map(|(i, (points, gf, ga, name))| {
                    standing(&format!("t{}", i), names[name], points, gf, ga, &[])
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_overall_is_sorted(raw in arb_standings()) {
            let result = aggregate(&raw, &[], &[], &[]).unwrap();
            prop_assert_eq!(result.overall.len(), raw.len());
            for pair in result.overall.entries.windows(2) {
                let (a, b) = (&pair[0].standing, &pair[1].standing);
                let ordered = a.points > b.points
                    || (a.points == b.points && a.goal_difference() > b.goal_difference())
                    || (a.points == b.points
                        && a.goal_difference() == b.goal_difference()
                        && a.goals_for > b.goals_for)
                    || (a.points == b.points
                        && a.goal_difference() == b.goal_difference()
                        && a.goals_for == b.goals_for
                        && a.team.name.to_lowercase() <= b.team.name.to_lowercase());
                prop_assert!(ordered, "{:?} before {:?}", a.team, b.team);
            }
        }

        #[test]
        fn prop_aggregate_is_stable(raw in arb_standings()) {
            let first = aggregate(&raw, &[], &[], &[]).unwrap();
            let mut reversed = raw.clone();
            reversed.reverse();
            let second = aggregate(&reversed, &[], &[], &[]).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
