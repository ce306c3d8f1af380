//! Property tests for tap handling on arbitrary boards.

use std::collections::HashSet;

use fragment_puzzle::{
    Board, GridPosition, GridSize, ManualClock, PuzzleEngine, TapEffect, TileSet,
};
use proptest::prelude::*;

fn origins(engine: &PuzzleEngine<ManualClock>) -> Vec<GridPosition> {
    engine.tiles().iter().map(|t| t.origin()).collect()
}

fn reference_origins(engine: &PuzzleEngine<ManualClock>) -> Vec<GridPosition> {
    engine.reference_tiles().iter().map(|t| t.origin()).collect()
}

fn engine_strategy() -> impl Strategy<Value = PuzzleEngine<ManualClock>> {
    (2u32..=5, any::<u64>()).prop_map(|(side, seed)| {
        let grid = GridSize::new(side).expect("grid");
        let mut engine = PuzzleEngine::with_seed(ManualClock::new(), seed);
        engine.setup_tiles(TileSet::blank(grid));
        assert!(!engine.is_solved(), "fresh shuffle reported solved");
        assert_ne!(origins(&engine), reference_origins(&engine));
        engine
    })
}

proptest! {
    #[test]
    fn taps_preserve_permutation_and_selection(
        mut engine in engine_strategy(),
        taps in prop::collection::vec(0usize..25, 0..60),
    ) {
        let reference: HashSet<GridPosition> = reference_origins(&engine).into_iter().collect();
        let len = engine.tiles().len();

        for index in taps {
            if engine.is_solved() {
                break;
            }
            let before = origins(&engine);
            let selected = engine.selected();
            match engine.tap(index) {
                Ok(TapEffect::Selected(i)) => {
                    prop_assert_eq!(selected, None);
                    prop_assert_eq!(engine.selected(), Some(i));
                    prop_assert_eq!(origins(&engine), before);
                }
                Ok(TapEffect::Deselected(i)) => {
                    prop_assert_eq!(selected, Some(i));
                    prop_assert_eq!(engine.selected(), None);
                    prop_assert_eq!(origins(&engine), before);
                }
                Ok(TapEffect::Swapped { first, second }) => {
                    prop_assert_eq!(selected, Some(first));
                    prop_assert_eq!(engine.selected(), None);
                    let after = origins(&engine);
                    prop_assert_eq!(after[first], before[second]);
                    prop_assert_eq!(after[second], before[first]);
                    for i in (0..len).filter(|i| *i != first && *i != second) {
                        prop_assert_eq!(after[i], before[i]);
                    }
                }
                Err(_) => {
                    prop_assert!(index >= len);
                    prop_assert_eq!(origins(&engine), before);
                    prop_assert_eq!(engine.selected(), selected);
                }
            }

            let current: HashSet<GridPosition> = origins(&engine).into_iter().collect();
            prop_assert_eq!(&current, &reference);
        }
    }

    #[test]
    fn fresh_setup_is_never_solved(side in 2u32..=6, seed in any::<u64>()) {
        let grid = GridSize::new(side).expect("grid");
        let mut engine = PuzzleEngine::with_seed(ManualClock::new(), seed);
        engine.setup_tiles(TileSet::blank(grid));

        prop_assert!(!engine.is_solved());
        prop_assert_eq!(engine.selected(), None);
        let current = origins(&engine);
        let reference = reference_origins(&engine);
        prop_assert_ne!(&current, &reference);

        let as_set: HashSet<GridPosition> = current.into_iter().collect();
        prop_assert_eq!(as_set, reference.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn solved_exactly_when_order_matches(
        side in 2u32..=4,
        seed in any::<u64>(),
    ) {
        let grid = GridSize::new(side).expect("grid");
        let mut rng_order: Vec<usize> = (0..grid.tile_count()).collect();
        rng_order.rotate_left((seed as usize % (grid.tile_count() - 1)) + 1);
        let board = Board::arranged(TileSet::blank(grid), &rng_order).expect("arrangement");
        prop_assert!(!board.is_solved());

        let mut engine = PuzzleEngine::with_seed(ManualClock::new(), seed);
        engine.setup_board(board).expect("unsolved");

        // Selection-sort the board back into reference order with swaps.
        let reference = reference_origins(&engine);
        for target in 0..reference.len() {
            let current = origins(&engine);
            if current == reference {
                break;
            }
            prop_assert!(!engine.is_solved());
            let from = current
                .iter()
                .position(|origin| *origin == reference[target])
                .expect("tile present");
            if from != target {
                engine.tap(target).expect("select");
                engine.tap(from).expect("swap");
            }
        }
        prop_assert!(engine.is_solved());
        prop_assert_eq!(origins(&engine), reference);
    }
}
