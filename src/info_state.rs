//! A player's private view of a hand: own card plus the public action
//! history. This is the solver's lookup key, and the only state an
//! agent may condition decisions on — the opponent's card is hidden.
//!
//! Identity (equality and hashing) is the card plus the action history.
//! Position and the terminal result are metadata: they show up in the
//! text rendering but never in the key, so both seats share one table
//! entry for a given (card, history).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::{Action, HandState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoState {
    /// Observing player's seat (metadata, not part of identity).
    pub pos: usize,
    /// The observing player's own card.
    pub card: Card,
    /// The public action sequence so far, in order, with the seat that
    /// acted.
    pub actions_taken: Vec<(usize, Action)>,
    /// The observing player's final stack delta, once the hand is over
    /// (metadata, not part of identity).
    pub result: Option<i64>,
}

impl InfoState {
    /// Derive the observed state for `pos` from a hand. The hand must
    /// have been dealt.
    pub fn observe(state: &HandState, pos: usize) -> Option<Self> {
        let card = state.players[pos].card?;
        let result = if state.is_over {
            Some(state.players[pos].stack)
        } else {
            None
        };
        Some(InfoState {
            pos,
            card,
            actions_taken: state.actions_taken.clone(),
            result,
        })
    }

    /// Observed state for the player currently to act.
    pub fn observe_acting(state: &HandState) -> Option<Self> {
        Self::observe(state, state.acting_pos)
    }

    /// Action history as a compact string, e.g. `"xbr"`.
    pub fn history_string(&self) -> String {
        self.actions_taken.iter().map(|(_, a)| a.code()).collect()
    }

    /// Canonical text key, `"{card}"` or `"{card}-{history}"`.
    pub fn key_string(&self) -> String {
        let history = self.history_string();
        if history.is_empty() {
            format!("{}", self.card)
        } else {
            format!("{}-{}", self.card, history)
        }
    }
}

impl PartialEq for InfoState {
    fn eq(&self, other: &Self) -> bool {
        self.card == other.card
            && self
                .actions_taken
                .iter()
                .map(|(_, a)| a)
                .eq(other.actions_taken.iter().map(|(_, a)| a))
    }
}

impl Eq for InfoState {}

impl Hash for InfoState {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.card.hash(hasher);
        for (_, action) in &self.actions_taken {
            action.hash(hasher);
        }
    }
}

impl fmt::Display for InfoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_string())?;
        if let Some(result) = self.result {
            write!(f, "-({})", result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Rank;
    use crate::hand::GameConfig;
    use std::collections::HashMap;

    fn hand_after(actions: &[Action]) -> HandState {
        let mut hand = HandState::new(GameConfig::default());
        hand.deal_pair([Card::new(Rank::Ace), Card::new(Rank::King)])
            .unwrap();
        for &a in actions {
            hand.apply(a).unwrap();
        }
        hand
    }

    #[test]
    fn hides_opponent_card() {
        let hand = hand_after(&[Action::Check]);
        let info = InfoState::observe_acting(&hand).unwrap();
        assert_eq!(info.pos, 1);
        assert_eq!(info.card, Card::new(Rank::King));
        assert_eq!(info.key_string(), "K-x");
    }

    #[test]
    fn identity_ignores_position_and_result() {
        let hand = hand_after(&[Action::Bet, Action::Call]);
        let from_winner = InfoState::observe(&hand, 0).unwrap();
        let mut as_live = from_winner.clone();
        as_live.pos = 1;
        as_live.result = None;
        assert_eq!(from_winner, as_live);

        let mut map: HashMap<InfoState, u32> = HashMap::new();
        map.insert(from_winner, 1);
        assert_eq!(map.get(&as_live), Some(&1));
    }

    #[test]
    fn identity_distinguishes_histories() {
        let checked = InfoState::observe(&hand_after(&[Action::Check]), 0).unwrap();
        let bet = InfoState::observe(&hand_after(&[Action::Bet]), 0).unwrap();
        assert_ne!(checked, bet);
    }

    #[test]
    fn terminal_result_in_rendering_only() {
        let hand = hand_after(&[Action::Bet, Action::Call]);
        let info = InfoState::observe(&hand, 0).unwrap();
        assert_eq!(info.result, Some(2));
        assert_eq!(format!("{}", info), "A-bc-(2)");
        assert_eq!(info.key_string(), "A-bc");
    }

    #[test]
    fn observe_before_deal_is_none() {
        let hand = HandState::new(GameConfig::default());
        assert!(InfoState::observe(&hand, 0).is_none());
    }
}
