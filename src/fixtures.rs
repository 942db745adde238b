/// Mock fixture data for testing and development
///
/// Deterministic data used by:
/// 1. Unit tests - predictable matches and standings
/// 2. The CLI when no snapshot file is given
/// 3. Benchmarks
///
/// The standings represent an 18-team league with two cuadrangular groups.
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;

use crate::types::{Match, Origin, Team, TeamId, TeamStanding};

/// Kickoff used by every fixture match unless overridden
pub fn fixture_kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 20, 20, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Feed match with the given code, status and optional (home, away) score
pub fn feed_match(code: &str, status: &str, score: Option<(u32, u32)>) -> Match {
    let mut game = Match::new(
        code,
        format!("Home {}", code),
        format!("Away {}", code),
        fixture_kickoff(),
    );
    game.status = status.to_string();
    if let Some((home, away)) = score {
        game.home_goals = Some(home);
        game.away_goals = Some(away);
    }
    if classify_live(status) {
        game.minute_elapsed = Some(30);
    }
    game
}

fn classify_live(status: &str) -> bool {
    crate::match_state::classify(status).is_live()
}

/// Stored match; an empty code means the match was created locally
pub fn local_match(id: i64, code: &str, status: &str, section_id: Option<i64>) -> Match {
    let mut game = feed_match(code, status, None);
    game.local_id = Some(id);
    game.section_id = section_id;
    game.origin = Origin::Local;
    if code.is_empty() {
        game.home_team = format!("Local Home {}", id);
        game.away_team = format!("Local Away {}", id);
    }
    game
}

/// Helper to build one standings row
pub fn standing(
    id: &str,
    name: &str,
    points: i32,
    goals_for: u32,
    goals_against: u32,
    groups: &[&str],
) -> TeamStanding {
    TeamStanding {
        team: Team {
            id: TeamId::new(id),
            name: name.to_string(),
            crest_url: None,
        },
        played: 18,
        won: (points.max(0) / 3) as u32,
        drawn: (points.max(0) % 3) as u32,
        lost: 0,
        goals_for,
        goals_against,
        points,
        group_membership: groups.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
    }
}

/// Create mock league standings (18 teams, ranked order not guaranteed)
pub fn create_mock_standings() -> Vec<TeamStanding> {
    vec![
        standing("jun", "Junior", 34, 30, 18, &["cuadrangular-a"]),
        standing("nac", "Atlético Nacional", 36, 33, 15, &["cuadrangular-b"]),
        standing("tol", "Deportes Tolima", 35, 27, 14, &["cuadrangular-a"]),
        standing("mil", "Millonarios", 33, 29, 20, &["cuadrangular-b"]),
        standing("sfe", "Santa Fe", 31, 24, 19, &["cuadrangular-a"]),
        standing("amer", "América de Cali", 31, 26, 21, &["cuadrangular-b"]),
        standing("med", "Independiente Medellín", 30, 25, 22, &["cuadrangular-a"]),
        standing("buc", "Atlético Bucaramanga", 29, 21, 17, &["cuadrangular-b"]),
        standing("cal", "Deportivo Cali", 26, 22, 23, &[]),
        standing("once", "Once Caldas", 25, 20, 21, &[]),
        standing("pas", "Deportivo Pasto", 24, 18, 20, &[]),
        standing("ali", "Alianza FC", 22, 19, 25, &[]),
        standing("agu", "Águilas Doradas", 22, 19, 25, &[]),
        standing("pereira", "Deportivo Pereira", 20, 17, 24, &[]),
        standing("env", "Envigado", 18, 15, 26, &[]),
        standing("pat", "Patriotas", 16, 14, 28, &[]),
        standing("fort", "Fortaleza", 15, 16, 29, &[]),
        standing("chi", "Boyacá Chicó", 12, 11, 31, &[]),
    ]
}

/// Create mock matches in various states
pub fn create_mock_matches() -> Vec<Match> {
    let kickoff = fixture_kickoff();
    let mut games = vec![
        Match::new("FX-1001", "Millonarios", "Santa Fe", kickoff),
        Match::new("FX-1002", "Junior", "Atlético Nacional", kickoff),
        Match::new("FX-1003", "Deportes Tolima", "América de Cali", kickoff),
        Match::new("FX-1004", "Once Caldas", "Deportivo Cali", kickoff),
    ];
    games[0].status = "2H".to_string();
    games[0].home_goals = Some(1);
    games[0].away_goals = Some(0);
    games[0].minute_elapsed = Some(67);
    games[0].venue = "El Campín".to_string();

    games[1].status = "HT".to_string();
    games[1].home_goals = Some(0);
    games[1].away_goals = Some(0);
    games[1].minute_elapsed = Some(45);

    games[2].status = "FT".to_string();
    games[2].home_goals = Some(2);
    games[2].away_goals = Some(2);
    games
}

/// Create mock stored matches; one promoted from the feed, one created locally
pub fn create_mock_stored_matches() -> Vec<Match> {
    vec![
        local_match(1, "FX-1001", "NS", Some(2)),
        Match {
            home_team: "Millonarios Femenino".to_string(),
            away_team: "Santa Fe Femenino".to_string(),
            ..local_match(2, "", "NS", Some(5))
        },
    ]
}
