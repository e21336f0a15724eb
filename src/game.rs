use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which direction of the derived metric counts as "better".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
}

impl Polarity {
    /// Returns true when `candidate` beats `incumbent`.
    pub fn prefers(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Polarity::LowerIsBetter => candidate < incumbent,
            Polarity::HigherIsBetter => candidate > incumbent,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// tap the highlighted circle as fast as possible
    ItemHunt,
    /// tap the highlighted circle while it grows
    GrowingHunt,
    /// pick the ink color, not the word
    Stroop,
    /// follow the marked card through the shuffle
    Monte,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::ItemHunt,
        GameKind::GrowingHunt,
        GameKind::Stroop,
        GameKind::Monte,
    ];

    /// Stable identifier used by the results store.
    pub fn id(self) -> u32 {
        match self {
            GameKind::ItemHunt => 1,
            GameKind::GrowingHunt => 2,
            GameKind::Stroop => 3,
            GameKind::Monte => 4,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::ItemHunt => "Item Hunt",
            GameKind::GrowingHunt => "Growing Item Hunt",
            GameKind::Stroop => "Stroop Effect",
            GameKind::Monte => "Three Card Monte",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            GameKind::ItemHunt => {
                "Press the key of the highlighted circle as fast as you can before time runs out."
            }
            GameKind::GrowingHunt => {
                "Press the key of the growing circle as fast as you can before time runs out."
            }
            GameKind::Stroop => {
                "Press the number of the button whose color matches the ink of the word, not its meaning."
            }
            GameKind::Monte => {
                "Remember where the marked card is, press SPACE to shuffle, follow it and pick it when the cards stop. Press ENTER for the next round."
            }
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            GameKind::Monte => Polarity::HigherIsBetter,
            _ => Polarity::LowerIsBetter,
        }
    }

    /// Metrics key holding the value personal bests are ranked by.
    pub fn derived_key(self) -> &'static str {
        match self {
            GameKind::ItemHunt | GameKind::GrowingHunt => "Result2",
            GameKind::Stroop | GameKind::Monte => "Result3",
        }
    }

    /// Unit suffix used when showing the derived metric.
    pub fn derived_unit(self) -> &'static str {
        match self {
            GameKind::Monte => "%",
            _ => "ms",
        }
    }

    pub fn derived_label(self) -> &'static str {
        match self {
            GameKind::ItemHunt | GameKind::GrowingHunt => "Average time per hit",
            GameKind::Stroop => "Average time per answer",
            GameKind::Monte => "Accuracy",
        }
    }

    pub fn counts_errors(self) -> bool {
        matches!(self, GameKind::Stroop | GameKind::Monte)
    }
}
