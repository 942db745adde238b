use anyhow::Result;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tracing::info;

use crate::commands::format_match_line;
use crate::config::Config;
use crate::engine::Engine;
use crate::formatting::format_header;
use crate::scheduler::Snapshot;

/// Grace period on top of the interval before a tick counts as idle
const SETTLE_TIME: Duration = Duration::from_secs(1);

pub fn format_snapshot(snapshot: &Snapshot, config: &Config) -> String {
    let refreshed = match snapshot.refreshed_at {
        Some(at) => {
            let secs = SystemTime::now()
                .duration_since(at)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            format!("refreshed {}s ago", secs)
        }
        None => "initial load".to_string(),
    };
    let mut output = format_header(
        &format!("Live #{} ({})", snapshot.generation, refreshed),
        false,
        &config.display,
    );

    let live: Vec<_> = snapshot.matches.iter().filter(|m| m.is_live()).collect();
    if live.is_empty() {
        output.push_str("No matches in play.\n");
    }
    for game in live {
        output.push_str(&format_match_line(game, &config.time_format));
        output.push('\n');
    }
    output
}

/// Line printed for a tick that published nothing
pub fn missed_update_message(failed: bool) -> &'static str {
    if failed {
        "Refresh failed; showing last snapshot."
    } else {
        "Nothing live; skipped refresh."
    }
}

/// Wait up to `wait` for the next published snapshot
pub async fn next_update(rx: &mut watch::Receiver<Snapshot>, wait: Duration) -> Option<Snapshot> {
    match tokio::time::timeout(wait, rx.changed()).await {
        Ok(Ok(())) => Some(rx.borrow_and_update().clone()),
        Ok(Err(_)) | Err(_) => None,
    }
}

pub async fn run(engine: &Engine, ticks: u32, config: &Config) -> Result<()> {
    let interval = Duration::from_secs(u64::from(config.refresh_interval.max(1)));
    let handle = engine.start_live_refresh(interval).await;
    let mut rx = handle.subscribe();

    let initial = rx.borrow_and_update().clone();
    print!("{}", format_snapshot(&initial, config));

    for _ in 0..ticks {
        let failures_before = handle.failure_count();
        match next_update(&mut rx, interval + SETTLE_TIME).await {
            Some(snapshot) => print!("\n{}", format_snapshot(&snapshot, config)),
            None => {
                let failed = handle.failure_count() > failures_before;
                println!("\n{}", missed_update_message(failed));
            }
        }
    }

    handle.stop();
    info!(
        "LIVE: Stopped after {} ticks, {} refreshes, {} failures",
        handle.tick_count(),
        handle.refresh_count(),
        handle.failure_count()
    );
    Ok(())
}
