//! Tests for level completion bookkeeping and progress statistics.

use std::time::Duration;

use fragment_puzzle::{
    Difficulty, LevelId, LevelRecord, apply_completion, completion_stats, is_playable,
    seed_levels, summarize,
};

fn record(id: &str, best_time: u32, is_resolved: bool) -> LevelRecord {
    LevelRecord::new(
        LevelId::new(id),
        format!("{id}.png"),
        3,
        Difficulty::Easy,
        best_time,
        is_resolved,
    )
}

#[test]
fn test_best_time_only_improves() {
    let mut levels = seed_levels();
    let first = levels[0].id().clone();

    let update = apply_completion(&mut levels, &first, Duration::from_secs(45)).expect("update");
    assert!(*update.improved());
    assert_eq!(*levels[0].best_time(), 45);
    assert!(*levels[1].is_resolved());

    let update = apply_completion(&mut levels, &first, Duration::from_secs(60)).expect("update");
    assert!(!*update.improved());
    assert_eq!(*levels[0].best_time(), 45);

    apply_completion(&mut levels, &first, Duration::from_secs(30)).expect("update");
    assert_eq!(*levels[0].best_time(), 30);
}

#[test]
fn test_completion_unlocks_next_level() {
    let mut levels = seed_levels();
    assert!(!is_playable(&levels, 3));

    let third = levels[2].id().clone();
    let update = apply_completion(&mut levels, &third, Duration::from_secs(12)).expect("update");

    assert_eq!(update.unlocked(), levels[3].id());
    assert!(is_playable(&levels, 3));
}

#[test]
fn test_last_level_completion_is_ignored() {
    let mut levels = seed_levels();
    let last = levels[9].id().clone();
    let before = levels.clone();

    assert!(apply_completion(&mut levels, &last, Duration::from_secs(5)).is_none());
    assert_eq!(levels, before);
}

#[test]
fn test_unknown_level_is_ignored() {
    let mut levels = seed_levels();
    let before = levels.clone();
    assert!(apply_completion(&mut levels, &LevelId::new("nope"), Duration::from_secs(5)).is_none());
    assert_eq!(levels, before);
}

#[test]
fn test_stats_average_only_timed_resolved_levels() {
    let levels = vec![record("a", 30, true), record("b", 0, true), record("c", 0, false)];
    let stats = completion_stats(&levels);

    assert_eq!(*stats.completed(), 2);
    assert_eq!(stats.average_formatted(), "00:30");
}

#[test]
fn test_stats_use_integer_average() {
    let levels = vec![record("a", 10, true), record("b", 15, true), record("c", 99, false)];
    let stats = completion_stats(&levels);

    assert_eq!(*stats.average_best_time(), Duration::from_secs(12));
}

#[test]
fn test_stats_for_fresh_progress() {
    let stats = completion_stats(&seed_levels());
    assert_eq!(*stats.completed(), 0);
    assert_eq!(stats.average_formatted(), "00:00");
}

#[test]
fn test_summaries_number_and_lock_levels() {
    let mut levels = seed_levels();
    let first = levels[0].id().clone();
    apply_completion(&mut levels, &first, Duration::from_secs(75)).expect("update");

    let rows = summarize(&levels);
    assert_eq!(rows.len(), 10);
    assert_eq!(*rows[0].number(), 1);
    assert_eq!(rows[0].best_time().as_deref(), Some("01:15"));
    assert_eq!(*rows[0].pieces(), 9);
    assert!(*rows[1].playable());
    assert!(!*rows[2].playable());
    assert_eq!(*rows[9].pieces(), 49);
}
