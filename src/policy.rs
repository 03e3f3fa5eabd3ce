//! The externally consumable strategy artifact: a mapping from info
//! state to a probability distribution over that state's legal actions.
//!
//! Action order inside a distribution is the legal-action enumeration
//! order of the hand machine, and sampling breaks floating-point
//! rounding ties by returning the last enumerated action, so sampling
//! always returns an action.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OclError, OclResult};
use crate::game_tree::{build_game_tree, GameTree};
use crate::hand::{Action, GameConfig, HandState};
use crate::info_state::InfoState;

/// A probability distribution over the legal actions at one info state.
/// `actions` and `probs` are parallel, in legal-action order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDistribution {
    pub actions: Vec<Action>,
    pub probs: Vec<f64>,
}

impl ActionDistribution {
    pub fn uniform(actions: Vec<Action>) -> Self {
        let p = 1.0 / actions.len() as f64;
        let probs = vec![p; actions.len()];
        ActionDistribution { actions, probs }
    }

    /// Weighted-random sample. If rounding leaves the cumulative sum
    /// short of 1.0, the last action is returned. None only for an
    /// empty distribution, which no well-formed policy contains.
    pub fn sample(&self, rng: &mut impl Rng) -> Option<Action> {
        let roll: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (&action, &p) in self.actions.iter().zip(&self.probs) {
            cumulative += p;
            if roll < cumulative {
                return Some(action);
            }
        }
        self.actions.last().copied()
    }

    /// Probability assigned to one action, 0.0 if absent.
    pub fn prob(&self, action: Action) -> f64 {
        self.actions
            .iter()
            .position(|&a| a == action)
            .map_or(0.0, |i| self.probs[i])
    }

    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }
}

/// One row of the JSON export, keyed by the canonical text rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRow {
    pub info: String,
    pub actions: Vec<String>,
    pub probs: Vec<f64>,
}

/// InfoState → action distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    entries: HashMap<InfoState, ActionDistribution>,
}

impl Policy {
    pub fn new() -> Self {
        Policy {
            entries: HashMap::new(),
        }
    }

    /// Uniform baseline policy over every decision info state of the
    /// enumerated tree.
    pub fn uniform(tree: &GameTree) -> Self {
        let mut entries = HashMap::new();
        for (info, actions) in tree.decision_info_states() {
            entries.insert(info, ActionDistribution::uniform(actions));
        }
        Policy { entries }
    }

    /// Uniform baseline policy for a config (enumerates the tree).
    pub fn uniform_for(config: GameConfig) -> OclResult<Self> {
        Ok(Self::uniform(&build_game_tree(config)?))
    }

    pub fn insert(&mut self, info: InfoState, dist: ActionDistribution) {
        self.entries.insert(info, dist);
    }

    pub fn get(&self, info: &InfoState) -> Option<&ActionDistribution> {
        self.entries.get(info)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InfoState, &ActionDistribution)> {
        self.entries.iter()
    }

    /// Choose an action for the player to act on `state`. Unseen info
    /// states fall back to uniform over the legal actions.
    pub fn get_action(&self, state: &HandState, rng: &mut impl Rng) -> OclResult<Action> {
        if state.is_over {
            return Err(OclError::HandAlreadyOver);
        }
        if !state.cards_dealt() {
            return Err(OclError::CardsNotDealt);
        }
        let valid = state.valid_actions();
        let sampled = InfoState::observe_acting(state)
            .and_then(|info| self.entries.get(&info))
            .and_then(|dist| dist.sample(rng));
        Ok(sampled.unwrap_or_else(|| valid[rng.gen_range(0..valid.len())]))
    }

    /// Rows sorted by (card, history) for stable display and export.
    pub fn sorted_rows(&self) -> Vec<PolicyRow> {
        let mut keyed: Vec<(&InfoState, &ActionDistribution)> = self.entries.iter().collect();
        keyed.sort_by_key(|(info, _)| (std::cmp::Reverse(info.card), info.history_string()));
        keyed
            .into_iter()
            .map(|(info, dist)| PolicyRow {
                info: info.key_string(),
                actions: dist.actions.iter().map(|a| a.label().to_string()).collect(),
                probs: dist.probs.clone(),
            })
            .collect()
    }

    /// Human-readable JSON export of the full policy.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.sorted_rows())
    }
}
