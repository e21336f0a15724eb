use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use super::{Round, RoundGenerator};
use crate::error::ConfigError;
use crate::target::next_index;

/// Time the cards rest after each permutation so the player can follow.
pub const SHUFFLE_PAUSE_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub id: usize,
    pub is_correct: bool,
}

/// Progress of one three-card-monte round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStage {
    /// Cards face up so the player can spot the marked one.
    Revealed,
    /// `done` permutations applied so far, each followed by a pause.
    Shuffling { done: u32 },
    /// Face down, waiting for a pick.
    Choosing,
    /// A card was picked; further picks are ignored.
    Resolved { picked: usize, correct: bool },
}

/// What happened when a shuffle pause ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// Another permutation was applied; pause again.
    Reshuffled,
    /// That was the last pause; the round is open for a pick.
    ReadyToChoose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShuffleRound {
    pub cards: Vec<Card>,
    pub stage: RevealStage,
    pub shuffle_count: u32,
    /// Card id order after each applied permutation.
    pub history: Vec<Vec<usize>>,
}

impl ShuffleRound {
    /// Lay out `card_count` cards with one marked at a random position.
    pub fn setup<R: Rng + ?Sized>(
        rng: &mut R,
        card_count: usize,
        shuffle_count: u32,
    ) -> Result<Self, ConfigError> {
        let correct = next_index(rng, card_count, None)?;
        let cards = (0..card_count)
            .map(|id| Card {
                id,
                is_correct: id == correct,
            })
            .collect();

        Ok(Self {
            cards,
            stage: RevealStage::Revealed,
            shuffle_count,
            history: Vec::with_capacity(shuffle_count as usize),
        })
    }

    pub fn correct_position(&self) -> Option<usize> {
        self.cards.iter().position(|c| c.is_correct)
    }

    pub fn ids(&self) -> Vec<usize> {
        self.cards.iter().map(|c| c.id).collect()
    }

    /// Cards are shown face up before the shuffle and after the pick.
    pub fn face_up(&self) -> bool {
        matches!(
            self.stage,
            RevealStage::Revealed | RevealStage::Resolved { .. }
        )
    }

    fn permute<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.history.push(self.ids());
    }

    /// Revealed -> Shuffling. Applies the first permutation immediately.
    /// Returns false if the round was not waiting to be shuffled.
    pub fn begin_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.stage != RevealStage::Revealed {
            return false;
        }
        if self.shuffle_count == 0 {
            self.stage = RevealStage::Choosing;
            return true;
        }
        self.permute(rng);
        self.stage = RevealStage::Shuffling { done: 1 };
        true
    }

    /// Called when the pause after a permutation has elapsed.
    pub fn pause_elapsed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PauseOutcome> {
        let RevealStage::Shuffling { done } = self.stage else {
            return None;
        };
        if done < self.shuffle_count {
            self.permute(rng);
            self.stage = RevealStage::Shuffling { done: done + 1 };
            Some(PauseOutcome::Reshuffled)
        } else {
            self.stage = RevealStage::Choosing;
            Some(PauseOutcome::ReadyToChoose)
        }
    }

    /// Choosing -> Resolved. Returns whether the pick was right, or `None`
    /// when the round is not accepting picks or `position` is off the table.
    pub fn pick(&mut self, position: usize) -> Option<bool> {
        if self.stage != RevealStage::Choosing {
            return None;
        }
        let correct = self.cards.get(position)?.is_correct;
        self.stage = RevealStage::Resolved {
            picked: position,
            correct,
        };
        Some(correct)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.stage, RevealStage::Resolved { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ShuffleRevealGenerator {
    card_count: usize,
    shuffle_count: u32,
}

impl ShuffleRevealGenerator {
    pub fn new(card_count: usize, shuffle_count: u32) -> Self {
        Self {
            card_count,
            shuffle_count,
        }
    }
}

impl RoundGenerator for ShuffleRevealGenerator {
    fn next_round(&mut self, rng: &mut dyn RngCore) -> Result<Round, ConfigError> {
        ShuffleRound::setup(rng, self.card_count, self.shuffle_count).map(Round::Reveal)
    }

    fn holds_resolved_round(&self) -> bool {
        true
    }
}
