//! Whole games with seeded dice: invariants, notation and snapshots hold throughout.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use strictly_backgammon::{
    BoardInvariants, CubeInvariants, Destination, Game, GameError, GameEvent, GameSnapshot,
    InvariantSet, MatchRules, MatchSession, Player, RandomDice, SessionSnapshot, TurnPhase, decode,
    encode, single_moves,
};

const MAX_TURNS: usize = 2_000;

/// Plays the current turn with random maximal sequences, checking every step.
fn play_turn(game: &mut Game, dice: &mut RandomDice, rng: &mut StdRng) {
    game.roll_with(dice).expect("Roll accepted");
    while !game.is_over() && game.turn().phase() == TurnPhase::AwaitingMove {
        let player = game.turn().player();
        let sequence = game
            .legal_sequences()
            .sequences()
            .choose(rng)
            .cloned()
            .expect("At least one sequence while awaiting a move");

        for mv in &sequence {
            // Hit flag and path survive the notation round trip.
            let decoded = decode(&encode(mv), player).expect("Encoded move decodes");
            assert!(decoded.same_path(mv));
            assert_eq!(decoded.is_hit, mv.is_hit);

            let played = game.commit_move(mv).expect("Generated move is legal");
            assert_eq!(played, *mv);
            assert!(BoardInvariants::check_all(game.board()).is_ok());
            assert!(CubeInvariants::check_all(game.cube()).is_ok());
            if game.is_over() {
                break;
            }
        }
    }
}

#[test]
fn test_random_games_preserve_invariants() {
    for seed in 0..12u64 {
        let mut dice = RandomDice::seeded(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let first = if seed % 2 == 0 { Player::White } else { Player::Black };
        let mut game = Game::new(MatchRules::money(false), false, first);

        for _ in 0..MAX_TURNS {
            if game.is_over() {
                break;
            }
            play_turn(&mut game, &mut dice, &mut rng);
        }

        let outcome = game.outcome().copied().expect("Game finishes");
        assert!(game.board().has_borne_off_all(outcome.winner), "seed {seed}");
        let ended = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }
}

/// Tries every locally legal single move on a copy of `game`.
///
/// Accepted moves must keep the maximal dice count reachable. Rejected ones
/// must be forced-usage refusals that leave the game exactly as it was.
fn check_every_single_move(game: &Game) {
    let turn = game.turn();
    let player = turn.player();
    let required = turn.max_dice();
    let consumed = turn.moves_applied().len() + 1;
    let legal = game.legal_moves();

    for mv in single_moves(game.board(), player, turn.dice()) {
        let mut trial = game.clone();
        match trial.commit_move(&mv) {
            Ok(played) => {
                assert!(played.same_path(&mv));
                assert!(played.die == mv.die || mv.to == Destination::Off);
                assert!(legal.contains(&played), "{played} is not an opening move");
                if trial.turn().player() == player {
                    assert_eq!(trial.turn().legal().max_dice() + consumed, required);
                } else {
                    assert_eq!(consumed, required, "turn ended early after {played}");
                }
            }
            Err(GameError::ForcedUsage { alternatives, .. }) => {
                assert!(!alternatives.is_empty());
                assert!(!legal.contains(&mv));
                assert_eq!(&trial, game);
            }
            Err(other) => panic!("locally legal {mv} rejected with {other}"),
        }
    }
}

#[test]
fn test_forced_usage_holds_in_random_positions() {
    for seed in 0..4u64 {
        let mut dice = RandomDice::seeded(seed);
        let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(31));
        let mut game = Game::new(MatchRules::money(false), false, Player::White);

        for _ in 0..MAX_TURNS {
            if game.is_over() {
                break;
            }
            game.roll_with(&mut dice).expect("Roll accepted");
            while !game.is_over() && game.turn().phase() == TurnPhase::AwaitingMove {
                check_every_single_move(&game);
                let mv = *game.legal_moves().choose(&mut rng).expect("A legal move");
                game.commit_move(&mv).expect("Legal move");
            }
        }
        assert!(game.is_over(), "seed {seed}");
    }
}

#[test]
fn test_snapshots_restore_mid_game() {
    let mut dice = RandomDice::seeded(99);
    let mut rng = StdRng::seed_from_u64(99);
    let mut game = Game::new(MatchRules::match_to(7), false, Player::White);

    for _ in 0..30 {
        if game.is_over() {
            break;
        }
        game.roll_with(&mut dice).expect("Roll accepted");

        // Restore between moves, while dice are still in hand.
        if let Some(mv) = game.legal_moves().first().copied() {
            game.commit_move(&mv).expect("Legal move");
            let snapshot = game.snapshot();
            let json = snapshot.to_json().expect("Serializes");
            let restored = Game::restore(GameSnapshot::from_json(&json).expect("Parses"))
                .expect("Consistent snapshot");
            assert_eq!(restored.snapshot(), snapshot);
            assert_eq!(restored.legal_moves(), game.legal_moves());
        }

        while !game.is_over() && game.turn().phase() == TurnPhase::AwaitingMove {
            let mv = game.legal_moves()[0];
            game.commit_move(&mv).expect("Legal move");
        }
    }
}

#[test]
fn test_corrupt_snapshot_rejected() {
    let game = Game::new(MatchRules::money(false), false, Player::White);
    let mut value = serde_json::to_value(game.snapshot()).expect("Serializes");
    value["board"]["points"][0] = serde_json::json!(3);
    let snapshot: GameSnapshot = serde_json::from_value(value).expect("Shape is still valid");
    assert!(Game::restore(snapshot).is_err());

    let mut value = serde_json::to_value(game.snapshot()).expect("Serializes");
    value["cube"]["value"] = serde_json::json!(3);
    let snapshot: GameSnapshot = serde_json::from_value(value).expect("Shape is still valid");
    assert!(Game::restore(snapshot).is_err());
}

#[test]
fn test_random_match_runs_to_completion() {
    let mut dice = RandomDice::seeded(2024);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut session =
        MatchSession::new(MatchRules::match_to(3), Player::White).expect("Valid rules");
    let mut match_ended = 0;
    let mut first = Player::White;

    // Every game is worth at least one point, so five games at most.
    for _ in 0..5 {
        for _ in 0..MAX_TURNS {
            if session.game().is_over() {
                break;
            }
            session.roll_with(&mut dice).expect("Roll accepted");
            while !session.game().is_over()
                && session.game().turn().phase() == TurnPhase::AwaitingMove
            {
                let sequence = session
                    .game()
                    .legal_sequences()
                    .sequences()
                    .choose(&mut rng)
                    .cloned()
                    .expect("At least one sequence while awaiting a move");
                session.commit_sequence(&sequence).expect("Generated sequence is legal");
            }
        }
        match_ended += session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::MatchEnded { .. }))
            .count();
        if session.is_match_over() {
            break;
        }
        first = first.opponent();
        session.start_next_game(first).expect("Next game");
    }

    assert!(session.is_match_over());
    assert_eq!(match_ended, 1);
    let winner = session.winner().expect("Winner");
    assert!(session.state().score(winner) >= 3);

    let json = session.snapshot().to_json().expect("Serializes");
    let restored = MatchSession::restore(SessionSnapshot::from_json(&json).expect("Parses"))
        .expect("Restores");
    assert_eq!(restored.snapshot(), session.snapshot());
}
