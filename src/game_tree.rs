//! Exhaustive enumeration of the game tree for a config.
//!
//! One subtree per ordered deal of two distinct cards, branching on
//! every legal action until terminal. The tree is finite because the
//! raise cap bounds depth. Used to seed a uniform baseline policy and
//! as ground truth for tests; the solver itself re-walks freshly
//! cloned states instead of sharing nodes.

use itertools::Itertools;

use crate::cards::{Card, Deck};
use crate::error::OclResult;
use crate::hand::{Action, GameConfig, HandState};
use crate::info_state::InfoState;

/// A node in the enumerated tree: a hand state and one child per legal
/// action taken from it. Terminal states have no children.
#[derive(Debug, Clone)]
pub struct GameNode {
    pub state: HandState,
    pub children: Vec<(Action, GameNode)>,
}

impl GameNode {
    pub fn is_terminal(&self) -> bool {
        self.state.is_over
    }

    /// Non-terminal (decision) nodes in this subtree, self included.
    pub fn count_action_nodes(&self) -> usize {
        if self.is_terminal() {
            return 0;
        }
        1 + self
            .children
            .iter()
            .map(|(_, c)| c.count_action_nodes())
            .sum::<usize>()
    }

    pub fn count_terminal_nodes(&self) -> usize {
        if self.is_terminal() {
            return 1;
        }
        self.children
            .iter()
            .map(|(_, c)| c.count_terminal_nodes())
            .sum()
    }

    /// Depth-first visit of every node in this subtree.
    pub fn visit(&self, f: &mut impl FnMut(&GameNode)) {
        f(self);
        for (_, child) in &self.children {
            child.visit(f);
        }
    }
}

/// The complete game tree: one expanded subtree per ordered deal.
#[derive(Debug)]
pub struct GameTree {
    pub config: GameConfig,
    pub deals: Vec<([Card; 2], GameNode)>,
}

impl GameTree {
    pub fn count_action_nodes(&self) -> usize {
        self.deals.iter().map(|(_, n)| n.count_action_nodes()).sum()
    }

    pub fn count_terminal_nodes(&self) -> usize {
        self.deals
            .iter()
            .map(|(_, n)| n.count_terminal_nodes())
            .sum()
    }

    pub fn visit(&self, mut f: impl FnMut(&GameNode)) {
        for (_, root) in &self.deals {
            root.visit(&mut f);
        }
    }

    /// Every distinct acting-player info state at a decision node,
    /// paired with its legal actions. Deduplicated by info-state
    /// identity, in first-visit order.
    pub fn decision_info_states(&self) -> Vec<(InfoState, Vec<Action>)> {
        let mut seen: Vec<(InfoState, Vec<Action>)> = Vec::new();
        self.visit(|node| {
            if node.is_terminal() {
                return;
            }
            if let Some(info) = InfoState::observe_acting(&node.state) {
                if !seen.iter().any(|(existing, _)| *existing == info) {
                    seen.push((info, node.state.valid_actions()));
                }
            }
        });
        seen
    }
}

/// Enumerate every reachable state for the config.
pub fn build_game_tree(config: GameConfig) -> OclResult<GameTree> {
    let deck = Deck::new(config.deck_size())?;
    let mut deals = Vec::new();
    for pair in deck.cards().iter().permutations(2) {
        let cards = [*pair[0], *pair[1]];
        let mut state = HandState::new(config);
        state.deal_pair(cards)?;
        deals.push((cards, expand(state)?));
    }
    Ok(GameTree { config, deals })
}

fn expand(state: HandState) -> OclResult<GameNode> {
    let mut children = Vec::new();
    // Terminal states are never branched on: valid_actions is empty.
    for action in state.valid_actions() {
        let mut next = state.clone();
        next.apply(action)?;
        children.push((action, expand(next)?));
    }
    Ok(GameNode { state, children })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kuhn_config_deal_count() {
        let tree = build_game_tree(GameConfig::new(3, 1, 1).unwrap()).unwrap();
        // 3 cards, ordered pairs of distinct cards.
        assert_eq!(tree.deals.len(), 6);
    }

    #[test]
    fn terminals_have_no_children() {
        let tree = build_game_tree(GameConfig::new(3, 1, 1).unwrap()).unwrap();
        tree.visit(|node| {
            if node.is_terminal() {
                assert!(node.children.is_empty());
                assert!(node.state.winner_pos.is_some());
            } else {
                assert!(!node.children.is_empty());
            }
        });
    }

    #[test]
    fn every_terminal_is_zero_sum() {
        let tree = build_game_tree(GameConfig::new(4, 2, 1).unwrap()).unwrap();
        tree.visit(|node| {
            if node.is_terminal() {
                let [a, b] = node.state.stacks();
                assert_eq!(a + b, 0, "terminal {} not zero-sum", node.state);
            }
        });
    }

    #[test]
    fn raise_bound_holds_everywhere() {
        let config = GameConfig::new(4, 2, 1).unwrap();
        let tree = build_game_tree(config).unwrap();
        tree.visit(|node| {
            assert!(node.state.raises_made <= config.max_raises());
        });
    }

    #[test]
    fn decision_info_states_deduplicate_across_deals() {
        let tree = build_game_tree(GameConfig::new(3, 1, 1).unwrap()).unwrap();
        // 3 cards x 6 reachable decision histories ("", x, b, xb, br, xbr).
        let infos = tree.decision_info_states();
        assert_eq!(infos.len(), 18);
        for (_, actions) in &infos {
            assert!(!actions.is_empty());
        }
    }
}
