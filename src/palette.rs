use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Colors used by the Stroop game. Each has a name shown as the word label
/// and an RGB value used to paint buttons and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Blue,
    Red,
    Orange,
    Yellow,
    Black,
    Purple,
    Brown,
}

pub const STROOP_PALETTE: [Color; 8] = [
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::Orange,
    Color::Yellow,
    Color::Black,
    Color::Purple,
    Color::Brown,
];

impl Color {
    /// Word shown to the player when this color is the label.
    pub fn name(self) -> &'static str {
        match self {
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
            Color::Red => "RED",
            Color::Orange => "ORANGE",
            Color::Yellow => "YELLOW",
            Color::Black => "BLACK",
            Color::Purple => "PURPLE",
            Color::Brown => "BROWN",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Green => (0, 128, 0),
            Color::Blue => (0, 0, 255),
            Color::Red => (255, 0, 0),
            Color::Orange => (255, 165, 0),
            Color::Yellow => (255, 255, 0),
            // pure black disappears on dark terminals
            Color::Black => (60, 60, 60),
            Color::Purple => (128, 0, 128),
            Color::Brown => (139, 69, 19),
        }
    }
}

/// Fill of the active circle in the hunt games.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ActiveColor {
    #[default]
    Gradient,
    Green,
    Red,
    Blue,
    Yellow,
    Magenta,
}

impl ActiveColor {
    pub const ALL: [ActiveColor; 6] = [
        ActiveColor::Gradient,
        ActiveColor::Green,
        ActiveColor::Red,
        ActiveColor::Blue,
        ActiveColor::Yellow,
        ActiveColor::Magenta,
    ];

    /// Numeric code stored with results. Gradients share -1.
    pub fn code(self) -> f64 {
        match self {
            ActiveColor::Gradient => -1.0,
            ActiveColor::Green => 0.0,
            ActiveColor::Red => 1.0,
            ActiveColor::Blue => 2.0,
            ActiveColor::Yellow => 3.0,
            ActiveColor::Magenta => 4.0,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
