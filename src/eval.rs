//! Exact policy evaluation.
//!
//! Computes the expected value of a policy profile for both seats by
//! full-tree traversal under uniform chance, and exploitability via a
//! best-response traversal. The best responder sees only its own card:
//! each of its decision points maximizes over the opponent-card
//! distribution it cannot distinguish, tracked as one parallel state
//! per possible opponent card with a reach weight.

use crate::cards::Deck;
use crate::error::{OclError, OclResult};
use crate::game_tree::{build_game_tree, GameNode};
use crate::hand::{GameConfig, HandState};
use crate::info_state::InfoState;
use crate::policy::Policy;

/// Expected stack delta per seat when both players follow `policy`,
/// averaged over all ordered deals. Unseen info states act uniformly.
pub fn expected_game_value(policy: &Policy, config: GameConfig) -> OclResult<[f64; 2]> {
    let tree = build_game_tree(config)?;
    let chance = 1.0 / tree.deals.len() as f64;
    let mut total = [0.0f64; 2];
    for (_, root) in &tree.deals {
        let value = policy_value(root, policy)?;
        total[0] += chance * value[0];
        total[1] += chance * value[1];
    }
    Ok(total)
}

fn policy_value(node: &GameNode, policy: &Policy) -> OclResult<[f64; 2]> {
    if node.is_terminal() {
        let stacks = node.state.stacks();
        return Ok([stacks[0] as f64, stacks[1] as f64]);
    }
    let info = InfoState::observe_acting(&node.state).ok_or(OclError::CardsNotDealt)?;
    let uniform = 1.0 / node.children.len() as f64;
    let dist = policy.get(&info);

    let mut value = [0.0f64; 2];
    for (action, child) in &node.children {
        let p = dist.map_or(uniform, |d| d.prob(*action));
        let child_value = policy_value(child, policy)?;
        value[0] += p * child_value[0];
        value[1] += p * child_value[1];
    }
    Ok(value)
}

/// Expected value for seat `br_pos` when it best-responds to `policy`
/// while the opponent follows it.
pub fn best_response_value(policy: &Policy, config: GameConfig, br_pos: usize) -> OclResult<f64> {
    let deck = Deck::new(config.deck_size())?;
    let cards = deck.cards().to_vec();
    let n = cards.len();
    let chance = 1.0 / (n * (n - 1)) as f64;

    let mut total = 0.0;
    for &br_card in &cards {
        // One parallel hand per opponent card the responder cannot
        // tell apart, each initially reachable with weight 1.
        let mut entries = Vec::with_capacity(n - 1);
        for &opp_card in cards.iter().filter(|&&c| c != br_card) {
            let mut state = HandState::new(config);
            let pair = if br_pos == 0 {
                [br_card, opp_card]
            } else {
                [opp_card, br_card]
            };
            state.deal_pair(pair)?;
            entries.push((state, 1.0f64));
        }
        total += br_value(&entries, br_pos, policy)?;
    }
    Ok(total * chance)
}

/// Best-response traversal over parallel states sharing one public
/// history. Responder nodes take the max over actions; opponent nodes
/// scale each state's reach by the opponent's policy probability.
fn br_value(entries: &[(HandState, f64)], br_pos: usize, policy: &Policy) -> OclResult<f64> {
    let Some((rep, _)) = entries.first() else {
        return Ok(0.0);
    };
    if rep.is_over {
        return Ok(entries
            .iter()
            .map(|(s, reach)| reach * s.players[br_pos].stack as f64)
            .sum());
    }

    let valid = rep.valid_actions();
    if rep.acting_pos == br_pos {
        let mut best = f64::NEG_INFINITY;
        for &action in &valid {
            let mut next = Vec::with_capacity(entries.len());
            for (state, reach) in entries {
                let mut child = state.clone();
                child.apply(action)?;
                next.push((child, *reach));
            }
            best = best.max(br_value(&next, br_pos, policy)?);
        }
        Ok(best)
    } else {
        let uniform = 1.0 / valid.len() as f64;
        let mut value = 0.0;
        for &action in &valid {
            let mut next = Vec::with_capacity(entries.len());
            for (state, reach) in entries {
                let info = InfoState::observe_acting(state).ok_or(OclError::CardsNotDealt)?;
                let p = policy.get(&info).map_or(uniform, |d| d.prob(action));
                let mut child = state.clone();
                child.apply(action)?;
                next.push((child, reach * p));
            }
            value += br_value(&next, br_pos, policy)?;
        }
        Ok(value)
    }
}

/// Average best-response gain over both seats. Zero at equilibrium.
pub fn exploitability(policy: &Policy, config: GameConfig) -> OclResult<f64> {
    let ev = expected_game_value(policy, config)?;
    let br_op = best_response_value(policy, config, 0)?;
    let br_ip = best_response_value(policy, config, 1)?;
    Ok(((br_op - ev[0]) + (br_ip - ev[1])) / 2.0)
}
