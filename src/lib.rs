//! One-card limit poker and a CFR solver for it.
//!
//! Two players ante, each receives a single card from a small
//! distinct-rank deck, and one betting street decides the pot. The
//! `hand` module enforces legal betting sequences and payouts, and the
//! `cfr` module trains a near-equilibrium policy by self-play over the
//! full game tree.

pub mod cards;
pub mod cfr;
pub mod cli;
pub mod error;
pub mod eval;
pub mod game_tree;
pub mod hand;
pub mod info_state;
pub mod policy;
