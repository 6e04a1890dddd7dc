//! Property tests over randomly played legal games.

use gridtac_engine::{Game, Line, Mark, Outcome, Phase, check_winner};
use proptest::prelude::*;

/// Plays a legal game driven by `choices`: each choice picks among the empty
/// squares that remain. Stops when the game ends or the choices run out.
fn play_random(size: usize, choices: &[usize]) -> Game {
    let mut game = Game::start(size).expect("valid size");
    for choice in choices {
        if game.is_finished() {
            break;
        }
        let empty: Vec<_> = game.board().empty_positions().collect();
        let pos = empty[choice % empty.len()];
        let mover = game.to_move();
        game.play(pos, mover).expect("legal move");
    }
    game
}

fn owners(game: &Game) -> Vec<Mark> {
    Line::all(game.size())
        .filter_map(|line| line.owner(game.board()))
        .collect()
}

proptest! {
    #[test]
    fn winner_is_stable_and_unique(size in 3usize..=5, choices in prop::collection::vec(any::<usize>(), 0..25)) {
        let game = play_random(size, &choices);

        let first = check_winner(game.board());
        prop_assert_eq!(first, check_winner(game.board()));

        let owners = owners(&game);
        prop_assert!(!(owners.contains(&Mark::X) && owners.contains(&Mark::O)));
        if let Some(winner) = first {
            prop_assert_eq!(owners[0], winner);
            prop_assert_eq!(game.outcome(), Some(Outcome::Winner(winner)));
        }
    }

    #[test]
    fn marks_alternate_from_x(size in 3usize..=5, choices in prop::collection::vec(any::<usize>(), 0..25)) {
        let game = play_random(size, &choices);
        let x = game.board().count(Mark::X);
        let o = game.board().count(Mark::O);
        prop_assert!(x == o || x == o + 1);
        prop_assert_eq!(x + o, game.history().len());

        let expected_turn = if x == o { Mark::X } else { Mark::O };
        prop_assert_eq!(game.to_move(), expected_turn);
    }

    #[test]
    fn sequence_numbers_are_dense(size in 3usize..=4, choices in prop::collection::vec(any::<usize>(), 0..16)) {
        let game = play_random(size, &choices);
        for (i, mv) in game.history().iter().enumerate() {
            prop_assert_eq!(mv.sequence as usize, i + 1);
        }
        prop_assert_eq!(game.next_sequence() as usize, game.history().len() + 1);
    }

    #[test]
    fn replay_rebuilds_identical_game(size in 3usize..=5, choices in prop::collection::vec(any::<usize>(), 0..25)) {
        let game = play_random(size, &choices);
        let rebuilt = Game::replay(size, game.history()).expect("history replays");
        prop_assert_eq!(&rebuilt, &game);
    }

    #[test]
    fn finished_games_reject_everything(choices in prop::collection::vec(any::<usize>(), 9..20)) {
        let game = play_random(3, &choices);
        prop_assert_eq!(game.phase(), Phase::Finished);

        let mut after = game.clone();
        for pos in game.board().empty_positions() {
            prop_assert!(after.play(pos, game.to_move()).is_err());
        }
        prop_assert_eq!(after, game);
    }
}
