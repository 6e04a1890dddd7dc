//! Tests for the turn controller over an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use gridtac::{
    GameError, GameId, GameStore, Heuristic, InMemoryStore, Mark, Minimax, MoveOutcome,
    MoveRequest, Outcome, PlaySettings, Position, SessionManager,
};
use proptest::prelude::*;

fn setup() -> (InMemoryStore, SessionManager) {
    let store = InMemoryStore::new();
    let manager = SessionManager::new(Arc::new(store.clone()), PlaySettings::default());
    (store, manager)
}

fn play(
    manager: &SessionManager,
    game_id: Option<GameId>,
    row: usize,
    col: usize,
    player: Mark,
    computer_enabled: bool,
) -> Result<MoveOutcome, GameError> {
    manager.submit_move(MoveRequest {
        game_id,
        size: None,
        row,
        col,
        player,
        computer_enabled,
    })
}

fn marks(outcome: &MoveOutcome) -> usize {
    outcome.board.iter().flatten().filter(|cell| cell.is_some()).count()
}

#[test]
fn test_reset_returns_empty_board() {
    let (store, manager) = setup();
    let view = manager.reset(Some(4)).expect("Reset failed");
    assert_eq!(view.board, vec![vec![None; 4]; 4]);
    assert_eq!(view.turn, Mark::X);
    assert_eq!(store.game_count(), 0, "Reset must not allocate a game");

    let err = manager.reset(Some(2)).unwrap_err();
    assert_eq!(err.kind(), "InvalidSize");
}

#[test]
fn test_board_size_limit() {
    let (store, manager) = setup();
    let max = *manager.settings().max_size();
    assert!(manager.reset(Some(max)).is_ok());
    assert_eq!(manager.reset(Some(max + 1)).unwrap_err().kind(), "InvalidSize");
    assert_eq!(manager.reset(Some(usize::MAX / 2)).unwrap_err().kind(), "InvalidSize");

    let err = manager
        .submit_move(MoveRequest {
            game_id: None,
            size: Some(usize::MAX / 2),
            row: 0,
            col: 0,
            player: Mark::X,
            computer_enabled: true,
        })
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidSize");
    assert_eq!(store.game_count(), 0);
    assert_eq!(manager.live_sessions(), 0);
}

#[test]
fn test_top_row_scenario_without_computer_reply() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(first.game_id);
    play(&manager, id, 1, 1, Mark::O, false).expect("Move failed");
    play(&manager, id, 0, 1, Mark::X, false).expect("Move failed");
    play(&manager, id, 2, 2, Mark::O, false).expect("Move failed");

    let last = play(&manager, id, 0, 2, Mark::X, true).expect("Move failed");
    assert_eq!(last.winner, Some(Outcome::Winner(Mark::X)));
    assert_eq!(last.computer_move, None);
    assert_eq!(marks(&last), 5);

    let record = store
        .load_game(first.game_id)
        .expect("Load failed")
        .expect("Game stored");
    assert_eq!(*record.winner(), Some(Outcome::Winner(Mark::X)));
    let sequences: Vec<u32> = record.moves().iter().map(|mv| mv.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    assert_eq!(manager.live_sessions(), 0, "Finished game is evicted");

    let err = play(&manager, id, 2, 0, Mark::O, false).unwrap_err();
    assert_eq!(err.kind(), "GameAlreadyFinished");
    assert_eq!(manager.live_sessions(), 0);
}

#[test]
fn test_computer_replies_to_x() {
    let (store, manager) = setup();
    let outcome = play(&manager, None, 1, 1, Mark::X, true).expect("Move failed");

    let reply = outcome.computer_move.expect("Computer should reply");
    assert_eq!(outcome.board[reply.row][reply.col], Some(Mark::O));
    assert_eq!(outcome.turn, Mark::X);
    assert_eq!(outcome.winner, None);
    assert_eq!(marks(&outcome), 2);
    assert_eq!(store.count_moves(outcome.game_id).expect("Count failed"), 2);
}

#[test]
fn test_computer_blocks_row() {
    let (_store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(first.game_id);
    play(&manager, id, 1, 1, Mark::O, false).expect("Move failed");

    let outcome = play(&manager, id, 0, 1, Mark::X, true).expect("Move failed");
    assert_eq!(outcome.computer_move, Some(Position::new(0, 2)));
}

#[test]
fn test_o_moves_never_trigger_computer() {
    let (_store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let outcome =
        play(&manager, Some(first.game_id), 1, 1, Mark::O, true).expect("Move failed");
    assert_eq!(outcome.computer_move, None);
    assert_eq!(outcome.turn, Mark::X);
}

#[test]
fn test_occupied_cell_leaves_everything_unchanged() {
    let (store, manager) = setup();
    let first = play(&manager, None, 1, 1, Mark::X, false).expect("Move failed");
    let id = first.game_id;

    let err = play(&manager, Some(id), 1, 1, Mark::O, false).unwrap_err();
    assert_eq!(err.kind(), "CellOccupied");
    assert_eq!(store.count_moves(id).expect("Count failed"), 1);

    let next = play(&manager, Some(id), 0, 0, Mark::O, false).expect("Move failed");
    assert_eq!(marks(&next), 2);
    assert_eq!(store.count_moves(id).expect("Count failed"), 2);
}

#[test]
fn test_draw_on_last_square() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(first.game_id);
    assert_eq!(manager.live_sessions(), 1);
    for (row, col, player) in [
        (0, 1, Mark::O),
        (0, 2, Mark::X),
        (1, 1, Mark::O),
        (1, 0, Mark::X),
        (1, 2, Mark::O),
        (2, 1, Mark::X),
        (2, 0, Mark::O),
    ] {
        let outcome = play(&manager, id, row, col, player, false).expect("Move failed");
        assert_eq!(outcome.winner, None);
    }

    let last = play(&manager, id, 2, 2, Mark::X, true).expect("Move failed");
    assert_eq!(last.winner, Some(Outcome::Draw));
    assert_eq!(last.computer_move, None);
    let record = store
        .load_game(first.game_id)
        .expect("Load failed")
        .expect("Game stored");
    assert_eq!(*record.winner(), Some(Outcome::Draw));
    assert_eq!(manager.live_sessions(), 0);
}

#[test]
fn test_persistence_failure_is_surfaced_without_rollback() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(first.game_id);

    store.set_unavailable(true);
    let err = play(&manager, id, 1, 1, Mark::O, false).unwrap_err();
    assert!(matches!(err, GameError::PersistenceUnavailable(_)));

    assert_eq!(store.count_moves(first.game_id).expect("Count failed"), 1);

    store.set_unavailable(false);
    let err = play(&manager, id, 1, 1, Mark::X, false).unwrap_err();
    assert_eq!(err.kind(), "CellOccupied", "In-memory move must survive the failure");
    assert_eq!(
        store.count_moves(first.game_id).expect("Count failed"),
        2,
        "Unsaved move is written by the next submission"
    );
}

#[test]
fn test_failed_write_with_computer_enabled_recovers() {
    let (store, manager) = setup();
    let first = play(&manager, None, 1, 1, Mark::X, true).expect("Move failed");
    assert_eq!(first.computer_move, Some(Position::new(0, 0)));
    let id = first.game_id;

    store.fail_next_writes(3);
    let err = play(&manager, Some(id), 0, 2, Mark::X, true).unwrap_err();
    assert!(matches!(err, GameError::PersistenceUnavailable(_)));
    assert_eq!(store.count_moves(id).expect("Count failed"), 2);

    // The owed reply lands on (2, 0) before X's next move is applied.
    let next = play(&manager, Some(id), 2, 2, Mark::X, true).expect("Move failed");
    assert_eq!(next.board[2][0], Some(Mark::O));
    assert_eq!(next.board[2][2], Some(Mark::X));
    assert_eq!(next.computer_move, Some(Position::new(1, 0)));
    assert_eq!(next.winner, Some(Outcome::Winner(Mark::O)));

    let record = store.load_game(id).expect("Load failed").expect("Game stored");
    let sequences: Vec<u32> = record.moves().iter().map(|mv| mv.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(*record.winner(), Some(Outcome::Winner(Mark::O)));
    assert_eq!(manager.replay(id).expect("Replay failed").board, next.board);
    assert_eq!(manager.live_sessions(), 0);
}

#[test]
fn test_failed_outcome_write_is_retried() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(first.game_id);
    for (row, col, player) in [(1, 0, Mark::O), (0, 1, Mark::X), (1, 1, Mark::O)] {
        play(&manager, id, row, col, player, false).expect("Move failed");
    }

    // Three attempts for the winning move succeed after two failures, then
    // every attempt at the outcome fails.
    store.fail_next_writes(5);
    let err = play(&manager, id, 0, 2, Mark::X, false).unwrap_err();
    assert!(matches!(err, GameError::PersistenceUnavailable(_)));
    assert_eq!(store.count_moves(first.game_id).expect("Count failed"), 5);
    assert_eq!(manager.live_sessions(), 1, "Kept until the outcome is stored");

    let err = play(&manager, id, 2, 2, Mark::O, false).unwrap_err();
    assert_eq!(err.kind(), "GameAlreadyFinished");
    let record = store
        .load_game(first.game_id)
        .expect("Load failed")
        .expect("Game stored");
    assert_eq!(*record.winner(), Some(Outcome::Winner(Mark::X)));
    assert_eq!(manager.live_sessions(), 0);
}

#[test]
fn test_unknown_game_not_found() {
    let (_store, manager) = setup();
    let err = play(&manager, Some(77), 0, 0, Mark::X, false).unwrap_err();
    assert!(matches!(err, GameError::GameNotFound(77)));
}

#[test]
fn test_stored_game_resumes_in_new_manager() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = first.game_id;
    play(&manager, Some(id), 1, 1, Mark::O, false).expect("Move failed");

    let restarted = SessionManager::new(Arc::new(store.clone()), PlaySettings::default());
    assert_eq!(restarted.live_sessions(), 0);

    let err = play(&restarted, Some(id), 2, 2, Mark::O, false).unwrap_err();
    assert_eq!(err.kind(), "WrongTurn");
    assert_eq!(restarted.live_sessions(), 1);

    play(&restarted, Some(id), 2, 2, Mark::X, false).expect("Move failed");
    let record = store.load_game(id).expect("Load failed").expect("Game stored");
    assert_eq!(record.moves().last().map(|mv| mv.sequence), Some(3));
}

#[test]
fn test_history_and_summary() {
    let (_store, manager) = setup();
    let won = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = Some(won.game_id);
    for (row, col, player) in [
        (1, 0, Mark::O),
        (0, 1, Mark::X),
        (1, 1, Mark::O),
        (0, 2, Mark::X),
    ] {
        play(&manager, id, row, col, player, false).expect("Move failed");
    }
    let open = play(&manager, None, 2, 2, Mark::X, false).expect("Move failed");

    let history = manager.history().expect("History failed");
    assert_eq!(history.games.len(), 2);
    assert_eq!(*history.games[0].id(), open.game_id);
    assert_eq!(*history.summary.total_games(), 2);
    assert_eq!(*history.summary.completed(), 1);
    assert_eq!(*history.summary.x_wins(), 1);
    assert_eq!(*history.summary.o_wins(), 0);
}

#[test]
fn test_replay_frames() {
    let (_store, manager) = setup();
    let first = play(&manager, None, 1, 1, Mark::X, true).expect("Move failed");
    let reply = first.computer_move.expect("Computer should reply");
    let (row, col) = [(0, 0), (2, 2)]
        .into_iter()
        .find(|&(row, col)| Position::new(row, col) != reply)
        .expect("One corner is free");
    let last = play(&manager, Some(first.game_id), row, col, Mark::X, true).expect("Move failed");

    let replay = manager.replay(first.game_id).expect("Replay failed");
    assert_eq!(replay.moves.len(), 4);
    assert_eq!(replay.frames.len(), 5);
    assert_eq!(replay.frames[0], vec![vec![None; 3]; 3]);
    assert_eq!(replay.frames[1][1][1], Some(Mark::X));
    assert_eq!(replay.board, last.board);
    assert_eq!(replay.frames.last(), Some(&last.board));

    assert!(matches!(manager.replay(999), Err(GameError::GameNotFound(999))));
}

#[test]
fn test_clear_history_drops_sessions() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    assert_eq!(manager.live_sessions(), 1);

    manager.clear_history().expect("Clear failed");
    assert_eq!(manager.live_sessions(), 0);
    assert_eq!(store.game_count(), 0);

    let err = play(&manager, Some(first.game_id), 1, 1, Mark::O, false).unwrap_err();
    assert!(matches!(err, GameError::GameNotFound(_)));
}

#[test]
fn test_concurrent_submissions_are_serialized() {
    let (store, manager) = setup();
    let first = play(&manager, None, 0, 0, Mark::X, false).expect("Move failed");
    let id = first.game_id;

    let handles: Vec<_> = [(1, 1), (2, 2), (0, 2), (2, 0)]
        .into_iter()
        .map(|(row, col)| {
            let manager = manager.clone();
            std::thread::spawn(move || play(&manager, Some(id), row, col, Mark::O, false))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(accepted, 1, "Only one O move fits this turn");
    for err in results.iter().filter_map(|result| result.as_ref().err()) {
        assert_eq!(err.kind(), "WrongTurn");
    }
    assert_eq!(store.count_moves(id).expect("Count failed"), 2);
}

#[test]
fn test_timed_search_still_replies() {
    let store = InMemoryStore::new();
    let settings = PlaySettings::new(
        Minimax::new(6, Heuristic::AllLines),
        Some(Duration::from_millis(20)),
        Duration::ZERO,
        0,
        4,
        4,
    );
    let manager = SessionManager::new(Arc::new(store), settings);
    let outcome = play(&manager, None, 0, 0, Mark::X, true).expect("Move failed");
    assert!(outcome.computer_move.is_some());
    assert_eq!(outcome.board.len(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stored_log_replays_to_live_board(size in 3usize..=4, choices in prop::collection::vec(any::<usize>(), 1..16)) {
        let (_store, manager) = setup();
        let mut game_id = None;
        let mut board = vec![vec![None; size]; size];
        let mut turn = Mark::X;

        for choice in choices {
            let empty: Vec<(usize, usize)> = (0..size * size)
                .map(|i| (i / size, i % size))
                .filter(|&(r, c)| board[r][c].is_none())
                .collect();
            let (row, col) = empty[choice % empty.len()];
            let outcome = manager
                .submit_move(MoveRequest { game_id, size: Some(size), row, col, player: turn, computer_enabled: false })
                .expect("legal move");
            game_id = Some(outcome.game_id);
            board = outcome.board;
            turn = outcome.turn;
            if outcome.winner.is_some() {
                break;
            }
        }

        let id = game_id.expect("at least one move");
        let replay = manager.replay(id).expect("replay");
        prop_assert_eq!(&replay.board, &board);
        prop_assert_eq!(replay.frames.len(), replay.moves.len() + 1);
    }
}
