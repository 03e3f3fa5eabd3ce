//! Enumeration-completeness tests with hand-computed ground truth.

use ocl_cli::game_tree::build_game_tree;
use ocl_cli::hand::GameConfig;
use ocl_cli::policy::Policy;

// ---------------------------------------------------------------------------
// Hand-computed terminal counts
// ---------------------------------------------------------------------------

// Per ordered deal with max_raises = 1, the terminal betting lines are:
//   xx, xbf, xbc, xbrf, xbrc, bf, bc, brf, brc          (9 lines)
// A 3-card deck has 6 ordered deals, so 54 terminal states.
#[test]
fn kuhn_config_terminal_count() {
    let tree = build_game_tree(GameConfig::new(3, 1, 1).unwrap()).unwrap();
    assert_eq!(tree.count_terminal_nodes(), 54);
}

// With max_raises = 0 the raise lines disappear:
//   xx, xbf, xbc, bf, bc                                (5 lines)
#[test]
fn no_raise_terminal_count() {
    let tree = build_game_tree(GameConfig::new(3, 0, 1).unwrap()).unwrap();
    assert_eq!(tree.count_terminal_nodes(), 5 * 6);
}

// With max_raises = 2 each street allows one re-raise:
//   b{f, c, r{f, c, r{f, c}}} -> 6 lines, plus x-prefixed 7 = 13
#[test]
fn two_raise_terminal_count() {
    let tree = build_game_tree(GameConfig::new(4, 2, 1).unwrap()).unwrap();
    // 4 cards -> 12 ordered deals.
    assert_eq!(tree.count_terminal_nodes(), 13 * 12);
}

// Decision histories with max_raises = 1: "", x, b, xb, br, xbr.
#[test]
fn kuhn_config_decision_counts() {
    let tree = build_game_tree(GameConfig::new(3, 1, 1).unwrap()).unwrap();
    assert_eq!(tree.count_action_nodes(), 6 * 6);
    assert_eq!(tree.decision_info_states().len(), 3 * 6);
}

#[test]
fn deal_count_scaling() {
    for deck_size in [3, 5, 8, 13] {
        let tree = build_game_tree(GameConfig::new(deck_size, 1, 1).unwrap()).unwrap();
        assert_eq!(tree.deals.len(), deck_size * (deck_size - 1));
    }
}

// ---------------------------------------------------------------------------
// Uniform policy seeding
// ---------------------------------------------------------------------------

#[test]
fn uniform_policy_matches_tree_info_states() {
    let config = GameConfig::new(4, 2, 1).unwrap();
    let tree = build_game_tree(config).unwrap();
    let policy = Policy::uniform(&tree);
    assert_eq!(policy.len(), tree.decision_info_states().len());
    for (info, dist) in policy.iter() {
        assert!(
            (dist.total() - 1.0).abs() < 1e-9,
            "uniform policy at {} not normalized",
            info
        );
        for &p in &dist.probs {
            assert!((p - 1.0 / dist.actions.len() as f64).abs() < 1e-9);
        }
    }
}

#[test]
fn terminal_states_are_never_branching_points() {
    let tree = build_game_tree(GameConfig::new(4, 2, 1).unwrap()).unwrap();
    tree.visit(|node| {
        if node.is_terminal() {
            assert!(node.children.is_empty());
        }
    });
}
