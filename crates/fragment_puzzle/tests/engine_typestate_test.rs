//! Tests for the puzzle lifecycle through the engine and the typestate API.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fragment_puzzle::{
    AspectRatio, Board, EnginePhase, GridPosition, GridSize, ManualClock, PuzzleEngine,
    PuzzleEvent, PuzzleReady, PuzzleResult, TapEffect, TapError, TileSet,
};
use image::{DynamicImage, Rgba, RgbaImage};

fn portrait_image() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(80, 100, |x, y| {
        Rgba([(x * 3) as u8, (y * 2) as u8, 0, 255])
    }))
}

fn grid(side: u32) -> GridSize {
    GridSize::new(side).expect("valid grid")
}

#[test]
fn test_setup_three_by_three_portrait() {
    let clock = ManualClock::new();
    let mut engine = PuzzleEngine::with_seed(clock, 7);

    engine
        .setup(&portrait_image(), grid(3), AspectRatio::PORTRAIT_4_5)
        .expect("setup");

    assert_eq!(engine.phase(), EnginePhase::Ready);
    assert_eq!(engine.tiles().len(), 9);
    let reference: Vec<GridPosition> = engine.reference_tiles().iter().map(|t| t.origin()).collect();
    let row_major: Vec<GridPosition> = grid(3).positions().collect();
    assert_eq!(reference, row_major);
    assert!(!engine.is_solved());
    assert_eq!(engine.elapsed(), Duration::ZERO);
}

#[test]
fn test_tap_sequence_starts_clock_and_swaps() {
    let clock = ManualClock::new();
    let mut engine = PuzzleEngine::with_seed(clock.clone(), 3);
    let board = Board::arranged(TileSet::blank(grid(3)), &[1, 0, 2, 3, 4, 5, 6, 8, 7])
        .expect("arrangement");
    engine.setup_board(board).expect("unsolved board");

    assert_eq!(engine.tap(0), Ok(TapEffect::Selected(0)));
    assert_eq!(engine.phase(), EnginePhase::Playing);
    assert!(engine.started_at().is_some());

    assert_eq!(engine.tap(0), Ok(TapEffect::Deselected(0)));
    assert_eq!(engine.selected(), None);

    let before: Vec<GridPosition> = engine.tiles().iter().map(|t| t.origin()).collect();
    assert_eq!(engine.tap(1), Ok(TapEffect::Selected(1)));
    assert_eq!(
        engine.tap(2),
        Ok(TapEffect::Swapped {
            first: 1,
            second: 2
        })
    );
    let after: Vec<GridPosition> = engine.tiles().iter().map(|t| t.origin()).collect();
    assert_eq!(after[1], before[2]);
    assert_eq!(after[2], before[1]);
    assert_eq!(engine.selected(), None);
}

#[test]
fn test_solving_stops_clock_and_rejects_taps() {
    let clock = ManualClock::new();
    let mut engine = PuzzleEngine::with_seed(clock.clone(), 3);
    let board = Board::arranged(TileSet::blank(grid(2)), &[1, 0, 2, 3]).expect("arrangement");
    engine.setup_board(board).expect("unsolved board");

    engine.tap(0).expect("select");
    clock.advance(Duration::from_secs(42));
    engine.tap(1).expect("winning swap");

    assert!(engine.is_solved());
    assert_eq!(engine.phase(), EnginePhase::Solved);
    assert_eq!(engine.elapsed_formatted(), "00:42");

    clock.advance(Duration::from_secs(10));
    assert_eq!(engine.elapsed(), Duration::from_secs(42));
    assert_eq!(engine.tap(0), Err(TapError::AlreadySolved));
    assert!(!engine.reset());
}

#[test]
fn test_reset_keeps_arrangement_and_clears_clock() {
    let clock = ManualClock::new();
    let mut engine = PuzzleEngine::with_seed(clock.clone(), 11);
    engine.setup_tiles(TileSet::blank(grid(3)));

    engine.tap(4).expect("select");
    clock.advance(Duration::from_secs(5));
    let arrangement: Vec<GridPosition> = engine.tiles().iter().map(|t| t.origin()).collect();

    assert!(engine.reset());
    assert_eq!(engine.phase(), EnginePhase::Ready);
    assert_eq!(engine.selected(), None);
    assert_eq!(engine.elapsed(), Duration::ZERO);
    let kept: Vec<GridPosition> = engine.tiles().iter().map(|t| t.origin()).collect();
    assert_eq!(kept, arrangement);
}

#[test]
fn test_out_of_range_tap_is_rejected_without_side_effects() {
    let mut engine = PuzzleEngine::with_seed(ManualClock::new(), 1);
    engine.setup_tiles(TileSet::blank(grid(2)));

    assert_eq!(
        engine.tap(4),
        Err(TapError::OutOfRange { index: 4, len: 4 })
    );
    assert_eq!(engine.phase(), EnginePhase::Ready);
}

#[test]
fn test_tap_before_setup() {
    let mut engine = PuzzleEngine::with_seed(ManualClock::new(), 1);
    assert_eq!(engine.tap(0), Err(TapError::NotStarted));
    assert!(engine.tiles().is_empty());
    assert!(!engine.reset());
}

#[test]
fn test_failed_setup_keeps_previous_puzzle() {
    let mut engine = PuzzleEngine::with_seed(ManualClock::new(), 1);
    engine.setup_tiles(TileSet::blank(grid(2)));

    let tiny = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
    assert!(engine.setup(&tiny, grid(5), AspectRatio::PORTRAIT_4_5).is_err());
    assert_eq!(engine.phase(), EnginePhase::Ready);
    assert_eq!(engine.tiles().len(), 4);
}

#[test]
fn test_observers_see_events_in_order() {
    let clock = ManualClock::new();
    let mut engine = PuzzleEngine::with_seed(clock, 5);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(move |event| sink.lock().expect("lock").push(event.clone()));

    let board = Board::arranged(TileSet::blank(grid(2)), &[1, 0, 2, 3]).expect("arrangement");
    engine.setup_board(board).expect("unsolved board");
    engine.tap(0).expect("select");
    engine.tap(1).expect("swap");

    let events = events.lock().expect("lock");
    assert!(matches!(events[0], PuzzleEvent::Setup { .. }));
    assert_eq!(events[1], PuzzleEvent::Started);
    assert_eq!(events[2], PuzzleEvent::Selected(0));
    assert_eq!(
        events[3],
        PuzzleEvent::Swapped {
            first: 0,
            second: 1
        }
    );
    assert!(matches!(events[4], PuzzleEvent::Solved { .. }));
    assert_eq!(events.len(), 5);
}

#[test]
fn test_typestate_lifecycle() {
    let board = Board::arranged(TileSet::blank(grid(2)), &[0, 1, 3, 2]).expect("arrangement");
    let ready = PuzzleReady::from_board(board).expect("unsolved");
    let start = Instant::now();

    let outcome = ready.tap(2, start).expect("first tap");
    assert_eq!(outcome.effect, TapEffect::Selected(2));
    let playing = match outcome.result {
        PuzzleResult::Playing(game) => game,
        PuzzleResult::Solved(_) => panic!("Selection cannot solve the puzzle"),
    };
    assert_eq!(playing.selected(), Some(2));

    let outcome = playing
        .tap(3, start + Duration::from_secs(9))
        .expect("second tap");
    match outcome.result {
        PuzzleResult::Solved(game) => assert_eq!(game.elapsed(), Duration::from_secs(9)),
        PuzzleResult::Playing(_) => panic!("Swap should solve the puzzle"),
    }
}

#[test]
fn test_solved_board_cannot_start() {
    let board = Board::solved(TileSet::blank(grid(3)));
    assert!(PuzzleReady::from_board(board).is_err());
}
