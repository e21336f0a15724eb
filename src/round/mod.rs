//! Round content for each game variant and the generators that build it.

pub mod color_word;
pub mod shuffle_reveal;
pub mod single_target;

use rand::RngCore;

pub use color_word::{ColorWordGenerator, ColorWordRound, BUTTON_COUNT};
pub use shuffle_reveal::{
    Card, PauseOutcome, RevealStage, ShuffleRevealGenerator, ShuffleRound, SHUFFLE_PAUSE_MS,
};
pub use single_target::{SingleTargetGenerator, TargetRound, CIRCLE_COUNT};

use crate::error::ConfigError;
use crate::palette::STROOP_PALETTE;
use crate::settings::GameSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum Round {
    Target(TargetRound),
    ColorWord(ColorWordRound),
    Reveal(ShuffleRound),
}

impl Round {
    /// Number of things the player can choose between.
    pub fn choices(&self) -> usize {
        match self {
            Round::Target(_) => CIRCLE_COUNT,
            Round::ColorWord(r) => r.buttons.len(),
            Round::Reveal(r) => r.cards.len(),
        }
    }
}

/// Strategy plugged into a session to produce its rounds.
pub trait RoundGenerator {
    fn next_round(&mut self, rng: &mut dyn RngCore) -> Result<Round, ConfigError>;

    /// Forget per-session memory (e.g. the last target) before a restart.
    fn reset(&mut self) {}

    /// Whether any answer resolves the round and leaves it on screen until the
    /// player asks for the next one. Otherwise only a correct answer moves on.
    fn holds_resolved_round(&self) -> bool;
}

pub fn generator_for(settings: &GameSettings) -> Box<dyn RoundGenerator> {
    match *settings {
        GameSettings::ItemHunt { color, .. } => {
            Box::new(SingleTargetGenerator::new(CIRCLE_COUNT, color, None))
        }
        GameSettings::GrowingHunt {
            color, growth_secs, ..
        } => Box::new(SingleTargetGenerator::new(
            CIRCLE_COUNT,
            color,
            Some(growth_secs * 1000.0),
        )),
        GameSettings::Stroop { .. } => {
            Box::new(ColorWordGenerator::new(&STROOP_PALETTE, BUTTON_COUNT))
        }
        GameSettings::Monte {
            card_count,
            shuffle_count,
            ..
        } => Box::new(ShuffleRevealGenerator::new(
            card_count as usize,
            shuffle_count,
        )),
    }
}
