//! Tests for score reconciliation and result accumulation.

use go_attack::{Color, FinalScore, GoGame, Move, RunAccumulator, RunContext, reconcile};

/// Empty board ended by two passes.
fn finished_empty(size: usize, komi: f64) -> GoGame {
    let mut game = GoGame::new(size, komi).unwrap();
    game.play_move(Move::Pass).unwrap();
    game.play_move(Move::Pass).unwrap();
    game
}

#[test]
fn test_margin_positive_when_victim_wins() {
    let game = finished_empty(9, 7.5);
    let engine = FinalScore::new(Some(Color::White), 7.5);

    let result = reconcile(&game, &engine, Color::White);
    assert_eq!(result.margin, 7.5);
    assert!(result.mismatch.is_none());
}

#[test]
fn test_margin_negative_when_victim_loses() {
    let game = finished_empty(9, 7.5);
    let engine = FinalScore::new(Some(Color::White), 7.5);

    let result = reconcile(&game, &engine, Color::Black);
    assert_eq!(result.margin, -7.5);
    assert!(result.mismatch.is_none());
}

#[test]
fn test_black_win_signed_for_both_victims() {
    let mut game = GoGame::new(5, 0.5).unwrap();
    for mv in ["C3", "pass", "pass"] {
        game.play_move(mv.parse().unwrap()).unwrap();
    }
    // 25 points for Black against komi
    let engine = FinalScore::new(Some(Color::Black), 24.5);

    assert_eq!(reconcile(&game, &engine, Color::Black).margin, 24.5);
    assert_eq!(reconcile(&game, &engine, Color::White).margin, -24.5);
    assert!(reconcile(&game, &engine, Color::Black).mismatch.is_none());
}

#[test]
fn test_draw_records_zero() {
    let game = finished_empty(9, 0.0);
    let engine = FinalScore::new(None, 0.0);

    let result = reconcile(&game, &engine, Color::Black);
    assert_eq!(result.margin, 0.0);
    assert!(result.mismatch.is_none());
}

#[test]
fn test_mismatch_reported_with_engine_margin() {
    let game = finished_empty(9, 7.5);
    let engine = FinalScore::new(Some(Color::White), 8.5);

    let result = reconcile(&game, &engine, Color::Black);
    // The engine's number is what gets recorded
    assert_eq!(result.margin, -8.5);
    let mismatch = result.mismatch.expect("expected a mismatch");
    assert_eq!(mismatch.engine_margin, 8.5);
    assert_eq!(mismatch.local_margin, 7.5);
    assert!(mismatch.to_string().contains("8.5"));
}

#[test]
fn test_accumulator_summary() {
    let mut acc = RunAccumulator::new();
    assert_eq!(acc.summary().mean, None);
    assert!(acc.summary().to_string().starts_with("Average score: n/a"));

    acc.record(-7.5);
    acc.record(2.5);
    acc.record(-1.0);
    acc.record_mismatch();
    acc.record_failure();

    let summary = acc.summary();
    assert_eq!(acc.margins(), &[-7.5, 2.5, -1.0]);
    assert_eq!(summary.mean, Some(-2.0));
    assert_eq!(summary.victim_wins, 1);
    assert_eq!(summary.victim_losses, 2);
    assert_eq!(summary.mismatches, 1);
    assert_eq!(summary.failed_games, 1);
    assert!(summary.to_string().starts_with("Average score: -2"));
}

#[test]
fn test_run_context_rng_is_reproducible() {
    use rand::RngCore;

    let mut first = RunContext::new(9);
    let mut second = RunContext::new(9);
    for _ in 0..3 {
        assert_eq!(first.game_rng().next_u64(), second.game_rng().next_u64());
    }

    let mut other = RunContext::new(10);
    assert_ne!(
        RunContext::new(9).game_rng().next_u64(),
        other.game_rng().next_u64()
    );
}
