use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use super::{Round, RoundGenerator};
use crate::error::ConfigError;
use crate::palette::Color;
use crate::target::next_index;

/// Buttons offered per Stroop round.
pub const BUTTON_COUNT: usize = 5;

/// The word `label_color.name()` is printed in the ink `correct_color`. The
/// right answer is the button painted `correct_color`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorWordRound {
    pub correct_color: Color,
    pub label_color: Color,
    pub buttons: Vec<Color>,
}

impl ColorWordRound {
    /// `None` when `idx` is not a button.
    pub fn is_correct(&self, idx: usize) -> Option<bool> {
        self.buttons.get(idx).map(|c| *c == self.correct_color)
    }

    pub fn correct_position(&self) -> Option<usize> {
        self.buttons.iter().position(|c| *c == self.correct_color)
    }
}

/// Build one round, also returning how many palette draws it took.
pub fn generate_counted<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &[Color],
    button_count: usize,
) -> Result<(ColorWordRound, usize), ConfigError> {
    if button_count < 2 {
        return Err(ConfigError::BelowMinimum {
            field: "buttons",
            value: button_count as f64,
            min: 2.0,
        });
    }
    if palette.len() < button_count {
        return Err(ConfigError::PaletteTooSmall {
            palette: palette.len(),
            buttons: button_count,
        });
    }

    let correct_idx = next_index(rng, palette.len(), None)?;
    let label_idx = next_index(rng, palette.len(), Some(correct_idx))?;
    let correct_color = palette[correct_idx];
    let label_color = palette[label_idx];

    let mut buttons = Vec::with_capacity(button_count);
    buttons.push(correct_color);
    buttons.push(label_color);

    let mut draws = 2;
    while buttons.len() < button_count {
        let candidate = palette[rng.gen_range(0..palette.len())];
        draws += 1;
        if !buttons.contains(&candidate) {
            buttons.push(candidate);
        }
    }

    buttons.shuffle(rng);

    debug_assert_eq!(
        buttons.iter().filter(|c| **c == correct_color).count(),
        1,
        "correct color must appear exactly once"
    );

    Ok((
        ColorWordRound {
            correct_color,
            label_color,
            buttons,
        },
        draws,
    ))
}

pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &[Color],
    button_count: usize,
) -> Result<ColorWordRound, ConfigError> {
    generate_counted(rng, palette, button_count).map(|(round, _)| round)
}

#[derive(Debug, Clone)]
pub struct ColorWordGenerator {
    palette: Vec<Color>,
    button_count: usize,
}

impl ColorWordGenerator {
    pub fn new(palette: &[Color], button_count: usize) -> Self {
        Self {
            palette: palette.to_vec(),
            button_count,
        }
    }
}

impl RoundGenerator for ColorWordGenerator {
    fn next_round(&mut self, rng: &mut dyn RngCore) -> Result<Round, ConfigError> {
        generate(rng, &self.palette, self.button_count).map(Round::ColorWord)
    }

    fn holds_resolved_round(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::STROOP_PALETTE;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn check_round(round: &ColorWordRound, button_count: usize) {
        assert_ne!(round.correct_color, round.label_color);
        assert_eq!(round.buttons.len(), button_count);
        let unique: HashSet<_> = round.buttons.iter().collect();
        assert_eq!(unique.len(), button_count, "duplicate colors in {round:?}");
        assert!(round.buttons.contains(&round.correct_color));
        assert!(round.buttons.contains(&round.label_color));
    }

    #[test]
    fn test_generated_rounds_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2_000 {
            let round = generate(&mut rng, &STROOP_PALETTE, BUTTON_COUNT).unwrap();
            check_round(&round, BUTTON_COUNT);
        }
    }

    #[test]
    fn test_is_correct_matches_ink_color() {
        let mut rng = StdRng::seed_from_u64(8);
        let round = generate(&mut rng, &STROOP_PALETTE, BUTTON_COUNT).unwrap();
        let pos = round.correct_position().unwrap();
        assert_eq!(round.is_correct(pos), Some(true));
        for idx in (0..BUTTON_COUNT).filter(|i| *i != pos) {
            assert_eq!(round.is_correct(idx), Some(false));
        }
        assert_eq!(round.is_correct(BUTTON_COUNT), None);
    }

    #[test]
    fn test_palette_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            generate(&mut rng, &STROOP_PALETTE[..4], 5),
            Err(ConfigError::PaletteTooSmall {
                palette: 4,
                buttons: 5
            })
        );
    }

    #[test]
    fn test_palette_equal_to_button_count_terminates() {
        let mut rng = StdRng::seed_from_u64(77);
        let palette = &STROOP_PALETTE[..5];
        let mut worst = 0;
        for _ in 0..2_000 {
            let (round, draws) = generate_counted(&mut rng, palette, 5).unwrap();
            check_round(&round, 5);
            worst = worst.max(draws);
        }
        // Filling the last three slots of five is a coupon-collector walk
        // with a mean of ~10 draws; 200 is far out in the tail.
        assert!(worst < 200, "took {worst} draws");
    }

    #[test]
    fn test_larger_palette_is_fast() {
        let mut rng = StdRng::seed_from_u64(78);
        for _ in 0..500 {
            let (_, draws) = generate_counted(&mut rng, &STROOP_PALETTE, BUTTON_COUNT).unwrap();
            assert!(draws < 100);
        }
    }

    #[test]
    fn test_correct_position_varies() {
        let mut rng = StdRng::seed_from_u64(4);
        let positions: HashSet<_> = (0..200)
            .map(|_| {
                generate(&mut rng, &STROOP_PALETTE, BUTTON_COUNT)
                    .unwrap()
                    .correct_position()
                    .unwrap()
            })
            .collect();
        assert_eq!(positions.len(), BUTTON_COUNT);
    }

    #[test]
    fn test_two_color_palette() {
        let mut rng = StdRng::seed_from_u64(4);
        let round = generate(&mut rng, &STROOP_PALETTE[..2], 2).unwrap();
        check_round(&round, 2);
        assert!(generate(&mut rng, &STROOP_PALETTE[..1], 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_rounds_are_well_formed(seed in any::<u64>(), buttons in 2usize..=8) {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = generate(&mut rng, &STROOP_PALETTE, buttons).unwrap();
            prop_assert_ne!(round.correct_color, round.label_color);
            prop_assert_eq!(round.buttons.len(), buttons);
            let unique: HashSet<_> = round.buttons.iter().collect();
            prop_assert_eq!(unique.len(), buttons);
        }
    }
}
