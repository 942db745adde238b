/// Merging feed and store matches into one deduplicated view
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::data_provider::LocalStore;
use crate::error::{EngineError, EngineResult, SourceError};
use crate::types::{Match, Origin};

/// Merge external and local snapshots.
///
/// Feed order is kept for everything the feed knows about; local-only
/// matches follow in ascending `local_id` order. A match present in both
/// comes out once, as the local copy carrying the feed's live fields.
pub fn reconcile(external: &[Match], local: &[Match]) -> Vec<Match> {
    let mut by_code: HashMap<&str, &Match> = HashMap::new();
    let mut by_id: HashMap<i64, &Match> = HashMap::new();
    for game in local {
        if game.has_external_code() {
            if by_code.contains_key(game.external_code.as_str()) {
                warn!(
                    "RECONCILE: Ignoring duplicate local row for {} (id {:?})",
                    game.external_code, game.local_id
                );
                continue;
            }
            by_code.insert(game.external_code.as_str(), game);
        } else if let Some(id) = game.local_id {
            if by_id.contains_key(&id) {
                warn!("RECONCILE: Ignoring duplicate local row with id {}", id);
                continue;
            }
            by_id.insert(id, game);
        } else {
            warn!(
                "RECONCILE: Skipping local match {} vs {} with neither code nor id",
                game.home_team, game.away_team
            );
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(external.len() + local.len());

    for feed_game in external {
        // Without a code a feed match can be neither deduplicated nor matched
        if !feed_game.has_external_code() {
            warn!(
                "RECONCILE: Feed match {} vs {} has no external code",
                feed_game.home_team, feed_game.away_team
            );
            let mut game = feed_game.clone();
            game.origin = Origin::External;
            merged.push(game);
            continue;
        }
        if !seen.insert(feed_game.external_code.as_str()) {
            warn!(
                "RECONCILE: Dropping duplicate feed entry for {}",
                feed_game.external_code
            );
            continue;
        }
        match by_code.get(feed_game.external_code.as_str()) {
            Some(stored) => merged.push(overlay_live_fields(stored, feed_game)),
            None => {
                let mut game = feed_game.clone();
                game.origin = Origin::External;
                merged.push(game);
            }
        }
    }

    let mut local_only: Vec<&Match> = by_code
        .values()
        .filter(|game| !seen.contains(game.external_code.as_str()))
        .copied()
        .chain(by_id.values().copied())
        .collect();
    // Entries without an id sort last, by code
    local_only.sort_by(|a, b| {
        (a.local_id.is_none(), a.local_id, &a.external_code)
            .cmp(&(b.local_id.is_none(), b.local_id, &b.external_code))
    });
    merged.extend(local_only.into_iter().map(|game| {
        let mut game = game.clone();
        game.origin = Origin::Local;
        game
    }));

    debug!(
        "RECONCILE: {} external + {} local -> {} matches",
        external.len(),
        local.len(),
        merged.len()
    );
    merged
}

/// Local copy wins, but the feed owns status, score and minute once the
/// match is under way or when storage never recorded a score.
fn overlay_live_fields(stored: &Match, feed_game: &Match) -> Match {
    let mut game = stored.clone();
    game.origin = Origin::Local;

    let feed_state = feed_game.state();
    let feed_is_newer = feed_state.has_started() || stored.home_goals.is_none();
    if feed_is_newer {
        game.status = feed_game.status.clone();
        game.home_goals = feed_game.home_goals;
        game.away_goals = feed_game.away_goals;
        game.minute_elapsed = feed_game.minute_elapsed;
    }
    game
}

/// Persist a feed match locally, optionally in a section
pub async fn promote(
    store: &dyn LocalStore,
    game: &Match,
    section_id: Option<i64>,
) -> EngineResult<Match> {
    if !game.has_external_code() {
        return Err(EngineError::Validation(format!(
            "cannot promote {} vs {}: match has no external code",
            game.home_team, game.away_team
        )));
    }

    let mut stored = store
        .create(game, section_id)
        .await
        .map_err(|e| SourceError::from_anyhow(store.source_name(), &e))?;
    stored.origin = Origin::Local;
    if stored.external_code.is_empty() {
        stored.external_code = game.external_code.clone();
    }
    info!(
        "RECONCILE: Promoted {} as local id {:?} (section {:?})",
        stored.external_code, stored.local_id, section_id
    );
    Ok(stored)
}
