//! Rock-paper-scissors elimination round used to pick who speaks.

use crate::error::{PersonaError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One of the three fixed symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    /// The single hand this hand beats.
    pub fn beats(self) -> Hand {
        match self {
            Hand::Rock => Hand::Scissors,
            Hand::Scissors => Hand::Paper,
            Hand::Paper => Hand::Rock,
        }
    }

    /// Draws a hand uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Hand {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Returns the winning hand if the draws are decisive.
///
/// A round is decisive iff exactly two distinct hands appear.
pub fn decide(draws: &[Hand]) -> Option<Hand> {
    let distinct: BTreeSet<Hand> = draws.iter().copied().collect();
    if distinct.len() != 2 {
        return None;
    }
    distinct
        .iter()
        .copied()
        .find(|hand| distinct.contains(&hand.beats()))
}

/// Outcome of a decided elimination game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EliminationResult {
    /// Everyone who drew the winning hand, in turn order
    pub winners: Vec<String>,
    /// `None` when a single participant won without drawing
    pub winning_hand: Option<Hand>,
    /// Number of rounds played, including the decisive one
    pub rounds: usize,
}

/// Repeats rock-paper-scissors rounds until one is decisive.
#[derive(Debug, Clone, Copy)]
pub struct EliminationGame {
    max_rounds: usize,
}

impl EliminationGame {
    pub const DEFAULT_MAX_ROUNDS: usize = 64;

    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Plays with uniformly random draws.
    pub fn play<R: Rng + ?Sized>(
        &self,
        participants: &[String],
        rng: &mut R,
    ) -> Result<EliminationResult> {
        self.play_with(participants, |_| Hand::random(&mut *rng))
    }

    /// Plays with draws supplied by `draw`, called once per participant per
    /// round in turn order.
    pub fn play_with<F>(&self, participants: &[String], mut draw: F) -> Result<EliminationResult>
    where
        F: FnMut(&str) -> Hand,
    {
        match participants {
            [] => return Err(PersonaError::EmptyRoster),
            [only] => {
                return Ok(EliminationResult {
                    winners: vec![only.clone()],
                    winning_hand: None,
                    rounds: 0,
                });
            }
            _ => {}
        }

        for round in 1..=self.max_rounds {
            let draws: Vec<Hand> = participants.iter().map(|p| draw(p.as_str())).collect();
            tracing::debug!(round, ?draws, "elimination round drawn");

            if let Some(winning) = decide(&draws) {
                let winners = participants
                    .iter()
                    .zip(&draws)
                    .filter(|(_, hand)| **hand == winning)
                    .map(|(p, _)| p.clone())
                    .collect();
                tracing::info!(round, hand = %winning, ?winners, "elimination decided");
                return Ok(EliminationResult {
                    winners,
                    winning_hand: Some(winning),
                    rounds: round,
                });
            }
        }

        tracing::warn!(rounds = self.max_rounds, "elimination undecided");
        Err(PersonaError::NoDecisionReached {
            rounds: self.max_rounds,
        })
    }
}

impl Default for EliminationGame {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ROUNDS)
    }
}
