//! Rank-only cards and the sized deck for one-card limit poker.
//!
//! Suits never affect play, so a card is just its rank. Decks are built
//! from the top of the 13-rank ladder downward: a 3-card deck holds
//! {A, K, Q}, a 4-card deck adds the Jack, and so on. Dealing pops from
//! the end of the (shuffled) deck, without replacement.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OclError, OclResult};

/// Card rank, Two low, Ace high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

impl Rank {
    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

/// A playing card. Equality and ordering are by rank alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Card {
    pub rank: Rank,
}

impl Card {
    pub fn new(rank: Rank) -> Self {
        Card { rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank.to_char())
    }
}

/// Deck size bounds: at least one card per player plus one dead card,
/// at most the full 13-rank ladder.
pub const MIN_DECK_SIZE: usize = 3;
pub const MAX_DECK_SIZE: usize = 13;

/// A finite deck of distinct-rank cards. Deals from the back.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build a deck of the `size` highest ranks, Ace first.
    pub fn new(size: usize) -> OclResult<Self> {
        if !(MIN_DECK_SIZE..=MAX_DECK_SIZE).contains(&size) {
            return Err(OclError::InvalidConfig(format!(
                "deck size must be between {} and {}, got {}",
                MIN_DECK_SIZE, MAX_DECK_SIZE, size
            )));
        }
        let cards = ALL_RANKS
            .iter()
            .rev()
            .take(size)
            .map(|&r| Card::new(r))
            .collect();
        Ok(Deck { cards })
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
    }

    /// Deal the back card. Returns None once the deck is exhausted.
    pub fn deal(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
