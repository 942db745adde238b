use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matchday::commands::standings::format_standings;
use matchday::config::DisplayConfig;
use matchday::fixtures::{create_mock_standings, feed_match, local_match, standing};
use matchday::match_state::classify;
use matchday::reconcile::reconcile;
use matchday::standings::{aggregate, GroupDefinition, ZoneBoundary};
use matchday::types::{Match, TeamId, TeamStanding};

/// A 40-team league with four declared groups
fn create_large_standings() -> Vec<TeamStanding> {
    (0..40)
        .map(|i| {
            let group = format!("group-{}", i % 4);
            standing(
                &format!("t{:02}", i),
                &format!("Team {:02}", i),
                90 - (i as i32 * 2) / 3,
                60 - i as u32 / 2,
                20 + i as u32 / 3,
                &[group.as_str()],
            )
        })
        .collect()
}

fn groups(count: usize) -> Vec<GroupDefinition> {
    (0..count)
        .map(|i| GroupDefinition::new(&format!("group-{}", i), Vec::<TeamId>::new()))
        .collect()
}

fn zones() -> Vec<ZoneBoundary> {
    vec![
        ZoneBoundary::new(4, "continental"),
        ZoneBoundary::new(8, "playoff"),
        ZoneBoundary::rest("none"),
    ]
}

/// Benchmark building the overall and group tables
fn bench_aggregate(c: &mut Criterion) {
    let league = create_mock_standings();
    let large = create_large_standings();
    let league_groups = vec![
        GroupDefinition::new("cuadrangular-a", Vec::<TeamId>::new()),
        GroupDefinition::new("cuadrangular-b", Vec::<TeamId>::new()),
    ];
    let large_groups = groups(4);
    let zones = zones();
    let group_zones = vec![ZoneBoundary::new(1, "final"), ZoneBoundary::rest("out")];

    let mut group = c.benchmark_group("aggregate");

    group.bench_function("league_18_teams", |b| {
        b.iter(|| {
            aggregate(
                black_box(&league),
                black_box(&league_groups),
                black_box(&zones),
                black_box(&group_zones),
            )
        })
    });

    group.bench_function("league_40_teams_4_groups", |b| {
        b.iter(|| {
            aggregate(
                black_box(&large),
                black_box(&large_groups),
                black_box(&zones),
                black_box(&group_zones),
            )
        })
    });

    group.finish();
}

/// Benchmark merging a feed page with the local store
fn bench_reconcile(c: &mut Criterion) {
    let external: Vec<Match> = (0..200)
        .map(|i| feed_match(&format!("FX-{}", i), if i % 3 == 0 { "2H" } else { "NS" }, None))
        .collect();
    let local: Vec<Match> = (0..100)
        .map(|i| {
            let code = if i % 2 == 0 { format!("FX-{}", i) } else { String::new() };
            local_match(i + 1, &code, "NS", Some(1))
        })
        .collect();

    c.bench_function("reconcile_200_feed_100_local", |b| {
        b.iter(|| reconcile(black_box(&external), black_box(&local)))
    });
}

/// Benchmark status lookup and table rendering
fn bench_presentation(c: &mut Criterion) {
    let result = aggregate(
        &create_mock_standings(),
        &[],
        &zones(),
        &[],
    )
    .unwrap_or_else(|e| panic!("bench setup failed: {}", e));
    let display = DisplayConfig::default();

    let mut group = c.benchmark_group("presentation");

    group.bench_function("classify_statuses", |b| {
        b.iter(|| {
            for raw in ["NS", "1h", " HT ", "FINISHED", "SUSP"] {
                black_box(classify(black_box(raw)));
            }
        })
    });

    group.bench_function("format_standings", |b| {
        b.iter(|| format_standings(black_box(&result), black_box(&display)))
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_reconcile, bench_presentation);
criterion_main!(benches);
