use rand::RngCore;

use super::{Round, RoundGenerator};
use crate::error::ConfigError;
use crate::palette::ActiveColor;
use crate::target::TargetSelector;

/// Number of circles on the hunt board.
pub const CIRCLE_COUNT: usize = 20;

/// One highlighted circle. In the growing variant it swells from nothing to
/// full size over `growth_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRound {
    pub active_index: usize,
    pub color: ActiveColor,
    pub growth_ms: Option<f64>,
}

impl TargetRound {
    pub fn is_active(&self, idx: usize) -> bool {
        idx == self.active_index
    }

    /// Size of the active circle in `[0, 1]` after `round_elapsed_ms`.
    pub fn size_fraction(&self, round_elapsed_ms: i64) -> f64 {
        match self.growth_ms {
            None => 1.0,
            Some(g) if g <= 0.0 => 1.0,
            Some(g) => (round_elapsed_ms.max(0) as f64 / g).min(1.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SingleTargetGenerator {
    selector: TargetSelector,
    color: ActiveColor,
    growth_ms: Option<f64>,
}

impl SingleTargetGenerator {
    pub fn new(pool_size: usize, color: ActiveColor, growth_ms: Option<f64>) -> Self {
        Self {
            selector: TargetSelector::new(pool_size),
            color,
            growth_ms,
        }
    }
}

impl RoundGenerator for SingleTargetGenerator {
    fn next_round(&mut self, rng: &mut dyn RngCore) -> Result<Round, ConfigError> {
        let active_index = match self.selector.last() {
            None => self.selector.first(rng)?,
            Some(_) => self.selector.next(rng)?,
        };
        Ok(Round::Target(TargetRound {
            active_index,
            color: self.color,
            growth_ms: self.growth_ms,
        }))
    }

    fn reset(&mut self) {
        self.selector = TargetSelector::new(self.selector.pool_size());
    }

    fn holds_resolved_round(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn active(round: Round) -> usize {
        match round {
            Round::Target(t) => t.active_index,
            other => panic!("unexpected round {other:?}"),
        }
    }

    #[test]
    fn test_consecutive_targets_differ() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut generator = SingleTargetGenerator::new(CIRCLE_COUNT, ActiveColor::Red, None);
        let mut prev = active(generator.next_round(&mut rng).unwrap());
        for _ in 0..500 {
            let next = active(generator.next_round(&mut rng).unwrap());
            assert!(next < CIRCLE_COUNT);
            assert_ne!(next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_single_circle_board_cannot_advance() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut generator = SingleTargetGenerator::new(1, ActiveColor::Red, None);
        assert!(generator.next_round(&mut rng).is_ok());
        assert_eq!(
            generator.next_round(&mut rng),
            Err(ConfigError::UnsatisfiableExclusion {
                pool_size: 1,
                exclude: 0
            })
        );
    }

    #[test]
    fn test_growth_fraction() {
        let round = TargetRound {
            active_index: 0,
            color: ActiveColor::Gradient,
            growth_ms: Some(2000.0),
        };
        assert_eq!(round.size_fraction(0), 0.0);
        assert_eq!(round.size_fraction(500), 0.25);
        assert_eq!(round.size_fraction(2000), 1.0);
        assert_eq!(round.size_fraction(9000), 1.0);

        let instant = TargetRound {
            growth_ms: Some(0.0),
            ..round.clone()
        };
        assert_eq!(instant.size_fraction(0), 1.0);

        let fixed = TargetRound {
            growth_ms: None,
            ..round
        };
        assert_eq!(fixed.size_fraction(0), 1.0);
    }
}
