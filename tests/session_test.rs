//! Tests for single-game orchestration against the fake engine.

mod common;

use common::{FakeOptions, ready_channel, test_config};
use go_attack::{Color, Move, Orchestrator, Phase, PolicyKind, RunContext};

#[tokio::test]
async fn test_pass_forcing_game_on_full_board() {
    let (channel, engine) = ready_channel(FakeOptions::default()).await;
    let config = test_config(PolicyKind::Edge, Color::Black)
        .with_board_size(19)
        .with_turns_before_pass(5);
    let mut orchestrator = Orchestrator::new(channel, &config);
    let mut ctx = RunContext::new(42);

    let outcome = orchestrator.play_game(0, &mut ctx).await.unwrap();
    assert_eq!(orchestrator.phase(), Phase::Done);

    // Four edge moves, the fifth call passes and the victim answers with a pass
    assert_eq!(outcome.attacker_turns, 5);
    assert_eq!(outcome.victim_turns, 6);
    let history = outcome.game.history();
    assert_eq!(history.len(), 11);
    assert_eq!(history[0].0, Color::Black);
    assert_eq!(history[9], (Color::White, Move::Pass));
    assert_eq!(history[10], (Color::Black, Move::Pass));
    assert!(
        history[..9].iter().all(|(_, mv)| !mv.is_pass()),
        "nobody passes before the threshold"
    );

    assert_eq!(outcome.engine_score.winner, Some(Color::White));
    assert!(outcome.margin < 0.0);
    assert!(outcome.mismatch.is_none());

    let commands = engine.commands();
    assert_eq!(commands[0], "boardsize 19");
    assert_eq!(commands[1], "komi 7.5");
    assert_eq!(commands[2], "genmove B");
    assert_eq!(commands.last().map(String::as_str), Some("clear_board"));
    assert_eq!(engine.count("clear_board"), 1);
    assert_eq!(engine.count("genmove"), 6);
    assert_eq!(engine.count("play"), 5);
}

#[tokio::test]
async fn test_local_game_matches_engine_game() {
    let (channel, engine) = ready_channel(FakeOptions::default()).await;
    let config = test_config(PolicyKind::Random, Color::White).with_turns_before_pass(30);
    let mut orchestrator = Orchestrator::new(channel, &config);
    let mut ctx = RunContext::new(7);

    let first = orchestrator.play_game(0, &mut ctx).await.unwrap();
    let second = orchestrator.play_game(1, &mut ctx).await.unwrap();

    let engine_games = engine.finished_games();
    assert_eq!(engine_games.len(), 2);
    assert_eq!(engine_games[0].history(), first.game.history());
    assert_eq!(engine_games[1].history(), second.game.history());
    assert_eq!(engine_games[0], first.game);

    // Attacker is Black and opens
    assert_eq!(first.game.history()[0].0, Color::Black);
    assert!(first.game.is_over());

    // Board setup is sent once and the board cleared once per game
    assert_eq!(engine.count("boardsize"), 1);
    assert_eq!(engine.count("komi"), 1);
    assert_eq!(engine.count("clear_board"), 2);
}

#[tokio::test]
async fn test_score_mismatch_dumps_boards() {
    let options = FakeOptions {
        score_skew: 1.0,
        ..FakeOptions::default()
    };
    let (channel, engine) = ready_channel(options).await;
    let config = test_config(PolicyKind::Pass, Color::White);
    let mut orchestrator = Orchestrator::new(channel, &config);

    let outcome = orchestrator
        .play_game(0, &mut RunContext::new(1))
        .await
        .unwrap();

    // Both sides pass on an empty board; the engine adds a point to komi
    assert_eq!(outcome.game.history().len(), 2);
    let mismatch = outcome.mismatch.expect("expected a mismatch");
    assert_eq!(mismatch.local_margin, 7.5);
    assert_eq!(mismatch.engine_margin, 8.5);
    assert_eq!(outcome.margin, 8.5);
    assert_eq!(engine.count("showboard"), 1);
}

#[tokio::test]
async fn test_myopic_asks_engine_for_attacker_move() {
    let (channel, engine) = ready_channel(FakeOptions::default()).await;
    let config = test_config(PolicyKind::Myopic, Color::White).with_turns_before_pass(3);
    let mut orchestrator = Orchestrator::new(channel, &config);

    let outcome = orchestrator
        .play_game(0, &mut RunContext::new(1))
        .await
        .unwrap();

    assert_eq!(engine.count("reg_genmove"), 2);
    assert!(engine.commands().iter().any(|c| c == "reg_genmove B"));
    assert_eq!(engine.finished_games()[0].history(), outcome.game.history());
}

#[tokio::test]
async fn test_non_myopic_takes_victim_point() {
    let (channel, engine) = ready_channel(FakeOptions::default()).await;
    let config = test_config(PolicyKind::NonMyopic, Color::White).with_turns_before_pass(2);
    let mut orchestrator = Orchestrator::new(channel, &config);

    let outcome = orchestrator
        .play_game(0, &mut RunContext::new(1))
        .await
        .unwrap();

    assert!(engine.commands().iter().any(|c| c == "reg_genmove W"));
    // The victim would have opened on A1, so the attacker takes it first
    assert_eq!(outcome.game.history()[0], (Color::Black, "A1".parse().unwrap()));
    assert_eq!(engine.finished_games()[0].history(), outcome.game.history());
}

#[tokio::test]
async fn test_rejected_play_fails_the_game() {
    let options = FakeOptions {
        reject_plays: true,
        ..FakeOptions::default()
    };
    let (channel, engine) = ready_channel(options).await;
    let config = test_config(PolicyKind::Spiral, Color::Black);
    let mut orchestrator = Orchestrator::new(channel, &config);
    let mut ctx = RunContext::new(1);

    let err = orchestrator.play_game(0, &mut ctx).await.unwrap_err();
    assert!(!err.is_fatal_to_run());
    assert_eq!(orchestrator.phase(), Phase::Alternating);

    // The next game starts from a cleared board
    let _ = orchestrator.play_game(1, &mut ctx).await;
    assert_eq!(engine.count("clear_board"), 1);
    assert_eq!(engine.count("boardsize"), 1);
}
