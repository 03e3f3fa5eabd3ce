//! Solver convergence and persistence-contract tests.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ocl_cli::cards::{Card, Rank};
use ocl_cli::cfr::{train_seeded, CfrSolver, TrainedStrategy};
use ocl_cli::error::OclError;
use ocl_cli::eval::{expected_game_value, exploitability};
use ocl_cli::hand::{Action, GameConfig, HandState};
use ocl_cli::info_state::InfoState;
use ocl_cli::policy::Policy;

fn kuhn_config() -> GameConfig {
    GameConfig::new(3, 1, 1).unwrap()
}

/// Root info state for the first-acting player holding `rank`.
fn opening_info(config: GameConfig, rank: Rank, other: Rank) -> InfoState {
    let mut hand = HandState::new(config);
    hand.deal_pair([Card::new(rank), Card::new(other)]).unwrap();
    InfoState::observe_acting(&hand).unwrap()
}

// ---------------------------------------------------------------------------
// Convergence on the Kuhn-equivalent game
// ---------------------------------------------------------------------------

#[test]
fn converges_to_kuhn_equilibrium_class() {
    let config = kuhn_config();
    let policy = train_seeded(config, 200_000, 20_240_817).unwrap();

    // Opening frequencies for the first-acting player: bet the Ace,
    // check the King, bluff the Queen at a positive but low rate.
    let bet_ace = policy
        .get(&opening_info(config, Rank::Ace, Rank::King))
        .unwrap()
        .prob(Action::Bet);
    let bet_king = policy
        .get(&opening_info(config, Rank::King, Rank::Ace))
        .unwrap()
        .prob(Action::Bet);
    let bet_queen = policy
        .get(&opening_info(config, Rank::Queen, Rank::Ace))
        .unwrap()
        .prob(Action::Bet);

    assert!(bet_ace > 0.5, "should bet the top card often, got {}", bet_ace);
    assert!(bet_king < 0.3, "should mostly check the middle card, got {}", bet_king);
    assert!(
        bet_queen > 0.01 && bet_queen < 0.5,
        "bottom-card bluff rate should be positive but low, got {}",
        bet_queen
    );
    assert!(
        bet_ace > bet_queen,
        "value bets should outnumber bluffs ({} vs {})",
        bet_ace,
        bet_queen
    );

    // Long-run value to the first-acting player is -1/18 ante units.
    let ev = expected_game_value(&policy, config).unwrap();
    assert_relative_eq!(ev[0], -1.0 / 18.0, epsilon = 0.02);
    assert_relative_eq!(ev[0] + ev[1], 0.0, epsilon = 1e-9);

    // And the averaged policy is close to unexploitable.
    let gap = exploitability(&policy, config).unwrap();
    assert!(gap < 0.03, "exploitability {} too large after training", gap);
}

#[test]
fn training_beats_uniform_play() {
    let config = kuhn_config();
    let trained = train_seeded(config, 50_000, 3).unwrap();
    let uniform = Policy::uniform_for(config).unwrap();
    let trained_gap = exploitability(&trained, config).unwrap();
    let uniform_gap = exploitability(&uniform, config).unwrap();
    assert!(
        trained_gap < uniform_gap / 2.0,
        "training should at least halve exploitability ({} vs {})",
        trained_gap,
        uniform_gap
    );
}

// ---------------------------------------------------------------------------
// Trained-policy contracts
// ---------------------------------------------------------------------------

#[test]
fn policy_normalized_over_exactly_the_legal_actions() {
    let config = GameConfig::new(4, 2, 1).unwrap();
    let policy = train_seeded(config, 20_000, 9).unwrap();
    let mut rng = StdRng::seed_from_u64(100);

    for _ in 0..200 {
        let mut hand = HandState::new(config);
        hand.deal(&mut rng).unwrap();
        while !hand.is_over {
            let valid = hand.valid_actions();
            let info = InfoState::observe_acting(&hand).unwrap();
            if let Some(dist) = policy.get(&info) {
                assert_eq!(dist.actions, valid);
                assert!((dist.total() - 1.0).abs() < 1e-6);
            }
            let action = policy.get_action(&hand, &mut rng).unwrap();
            assert!(valid.contains(&action));
            hand.apply(action).unwrap();
        }
    }
}

#[test]
fn persistence_contract_exposes_all_fields() {
    let config = kuhn_config();
    let mut solver = CfrSolver::new(config);
    let mut rng = StdRng::seed_from_u64(55);
    solver.train(5_000, &mut rng).unwrap();

    let record = TrainedStrategy::from_solver(&solver);
    assert_eq!(record.config, config);
    assert_eq!(record.iterations, 5_000);
    assert_eq!(record.policy, solver.average_policy());
    assert_eq!(record.regret_sum.len(), solver.nodes().len());
    assert_eq!(record.strategy_sum.len(), solver.nodes().len());

    // Resuming from the record continues seamlessly.
    let mut resumed = record.into_solver();
    resumed.train(1_000, &mut rng).unwrap();
    assert_eq!(resumed.iterations(), 6_000);
}

#[test]
fn solver_errors_are_fatal_for_the_run() {
    // A solver over an unvalidated config cannot exist; the config
    // constructor refuses it before training can start.
    assert!(matches!(
        GameConfig::new(20, 1, 1),
        Err(OclError::InvalidConfig(_))
    ));
}
