//! Rules and the per-hand state machine for one-card limit poker.
//!
//! `HandState` is the single source of truth for action legality and
//! payouts. Transitions are fail-fast: acting on a terminal hand,
//! acting before the deal, dealing twice, or requesting an action
//! outside the legal set all return a distinct error instead of being
//! silently corrected.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Deck, MAX_DECK_SIZE, MIN_DECK_SIZE};
use crate::error::{OclError, OclResult};

/// Upper bound on the configurable raise cap.
pub const MAX_RAISE_CAP: u32 = 2;

/// The closed set of betting actions. Adding a variant changes the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Check,
    Bet,
    Call,
    Raise,
    Fold,
}

impl Action {
    /// One-letter code used in action-history strings (`x` for check).
    pub fn code(self) -> char {
        match self {
            Action::Check => 'x',
            Action::Bet => 'b',
            Action::Call => 'c',
            Action::Raise => 'r',
            Action::Fold => 'f',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Check => "Check",
            Action::Bet => "Bet",
            Action::Call => "Call",
            Action::Raise => "Raise",
            Action::Fold => "Fold",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validated, immutable rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    deck_size: usize,
    max_raises: u32,
    ante: i64,
}

impl GameConfig {
    pub fn new(deck_size: usize, max_raises: u32, ante: i64) -> OclResult<Self> {
        if !(MIN_DECK_SIZE..=MAX_DECK_SIZE).contains(&deck_size) {
            return Err(OclError::InvalidConfig(format!(
                "deck size must be between {} and {}, got {}",
                MIN_DECK_SIZE, MAX_DECK_SIZE, deck_size
            )));
        }
        if max_raises > MAX_RAISE_CAP {
            return Err(OclError::InvalidConfig(format!(
                "max raises must be between 0 and {}, got {}",
                MAX_RAISE_CAP, max_raises
            )));
        }
        if ante < 1 {
            return Err(OclError::InvalidConfig(format!(
                "ante must be at least 1, got {}",
                ante
            )));
        }
        Ok(GameConfig {
            deck_size,
            max_raises,
            ante,
        })
    }

    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    pub fn max_raises(&self) -> u32 {
        self.max_raises
    }

    pub fn ante(&self) -> i64 {
        self.ante
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            deck_size: 4,
            max_raises: 2,
            ante: 1,
        }
    }
}

impl fmt::Display for GameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.deck_size, self.max_raises)
    }
}

/// One player's slice of the hand: seat, running stack delta, card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub pos: usize,
    pub stack: i64,
    pub card: Option<Card>,
}

impl PlayerState {
    pub fn name(&self) -> &'static str {
        ["OP", "IP"][self.pos]
    }
}

/// Mutable state of a single hand.
///
/// Lifecycle: created with antes posted → cards dealt exactly once →
/// zero or more legal actions applied → terminal. Once `is_over` is
/// set, no further mutation is accepted. Until the pot is awarded,
/// `pot == -(stack[0] + stack[1])` holds at every step.
#[derive(Debug, Clone, PartialEq)]
pub struct HandState {
    pub config: GameConfig,
    pub players: [PlayerState; 2],
    pub acting_pos: usize,
    pub current_bet: i64,
    pub pot: i64,
    pub raises_made: u32,
    pub is_over: bool,
    pub showdown: bool,
    pub actions_taken: Vec<(usize, Action)>,
    pub winner_pos: Option<usize>,
}

impl HandState {
    /// Fresh hand with both antes in the pot and no cards dealt.
    pub fn new(config: GameConfig) -> Self {
        let ante = config.ante();
        HandState {
            config,
            players: [
                PlayerState {
                    pos: 0,
                    stack: -ante,
                    card: None,
                },
                PlayerState {
                    pos: 1,
                    stack: -ante,
                    card: None,
                },
            ],
            acting_pos: 0,
            current_bet: 0,
            pot: 2 * ante,
            raises_made: 0,
            is_over: false,
            showdown: false,
            actions_taken: Vec::new(),
            winner_pos: None,
        }
    }

    pub fn cards_dealt(&self) -> bool {
        self.players.iter().all(|p| p.card.is_some())
    }

    pub fn acting_player(&self) -> &PlayerState {
        &self.players[self.acting_pos]
    }

    pub fn stacks(&self) -> [i64; 2] {
        [self.players[0].stack, self.players[1].stack]
    }

    /// Shuffle a fresh deck and deal one card to each position.
    pub fn deal(&mut self, rng: &mut impl Rng) -> OclResult<()> {
        if self.cards_dealt() {
            return Err(OclError::AlreadyDealt);
        }
        let mut deck = Deck::new(self.config.deck_size())?;
        deck.shuffle(rng);
        for player in &mut self.players {
            player.card = deck.deal();
        }
        Ok(())
    }

    /// Assign a specific ordered pair of cards, used by tree enumeration
    /// and tests. Ranks must be distinct, as with a real deal.
    pub fn deal_pair(&mut self, cards: [Card; 2]) -> OclResult<()> {
        if self.cards_dealt() {
            return Err(OclError::AlreadyDealt);
        }
        if cards[0].rank == cards[1].rank {
            return Err(OclError::InvalidConfig(format!(
                "players cannot hold the same rank ({})",
                cards[0]
            )));
        }
        self.players[0].card = Some(cards[0]);
        self.players[1].card = Some(cards[1]);
        Ok(())
    }

    /// Legal actions for the acting player. Empty before the deal and
    /// after the hand ends.
    pub fn valid_actions(&self) -> Vec<Action> {
        if !self.cards_dealt() || self.is_over {
            return Vec::new();
        }
        if self.current_bet == 0 {
            vec![Action::Check, Action::Bet]
        } else {
            let mut valid = vec![Action::Call, Action::Fold];
            if self.raises_made < self.config.max_raises() {
                valid.push(Action::Raise);
            }
            valid
        }
    }

    /// Apply one action for the acting player and advance the state.
    pub fn apply(&mut self, action: Action) -> OclResult<()> {
        if self.is_over {
            return Err(OclError::HandAlreadyOver);
        }
        if !self.cards_dealt() {
            return Err(OclError::CardsNotDealt);
        }
        let valid = self.valid_actions();
        if !valid.contains(&action) {
            return Err(OclError::IllegalAction { action, valid });
        }

        self.actions_taken.push((self.acting_pos, action));

        match action {
            Action::Check => self.handle_check(),
            Action::Bet => self.handle_bet(),
            Action::Call => self.handle_call(),
            Action::Raise => self.handle_raise(),
            Action::Fold => self.handle_fold(),
        }

        self.acting_pos = (self.acting_pos + 1) % 2;

        if self.is_over {
            self.end_hand();
        }
        Ok(())
    }

    fn handle_check(&mut self) {
        // Second consecutive check closes the action.
        let n = self.actions_taken.len();
        if n >= 2 && self.actions_taken[n - 2].1 == Action::Check {
            self.is_over = true;
            self.showdown = true;
        }
    }

    fn handle_bet(&mut self) {
        self.current_bet = self.config.ante();
        self.pot += self.current_bet;
        self.players[self.acting_pos].stack -= self.current_bet;
    }

    fn handle_call(&mut self) {
        self.pot += self.current_bet;
        self.players[self.acting_pos].stack -= self.current_bet;
        self.is_over = true;
        self.showdown = true;
    }

    fn handle_raise(&mut self) {
        // The debit is the full new cumulative bet, not the increment.
        // The pot odds of this game depend on it; do not "fix" this.
        let new_bet = self.current_bet * 2;
        self.current_bet = new_bet;
        self.pot += new_bet;
        self.players[self.acting_pos].stack -= new_bet;
        self.raises_made += 1;
    }

    fn handle_fold(&mut self) {
        self.winner_pos = Some((self.acting_pos + 1) % 2);
        self.is_over = true;
    }

    /// Resolve the winner and award the pot. Showdown winner is the
    /// strictly higher rank; ranks are distinct by construction.
    fn end_hand(&mut self) {
        if self.showdown {
            let winner = if self.players[0].card > self.players[1].card {
                0
            } else {
                1
            };
            self.winner_pos = Some(winner);
        }
        if let Some(winner) = self.winner_pos {
            self.players[winner].stack += self.pot;
        }
    }

    /// Public action history as a compact string, e.g. `"xbr"`.
    pub fn history_string(&self) -> String {
        self.actions_taken
            .iter()
            .map(|(_, a)| a.code())
            .collect()
    }
}

impl fmt::Display for HandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for player in &self.players {
            match player.card {
                Some(card) => write!(f, "{}", card)?,
                None => write!(f, "?")?,
            }
        }
        if !self.actions_taken.is_empty() {
            write!(f, "-({})", self.history_string())?;
        }
        if self.is_over && self.winner_pos.is_some() {
            write!(f, "-({},{})", self.players[0].stack, self.players[1].stack)?;
        }
        Ok(())
    }
}
