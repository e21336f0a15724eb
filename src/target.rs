use rand::Rng;

use crate::error::ConfigError;

/// Upper bound on resampling before we declare the draw stuck. With at least
/// two candidates the chance of hitting this is below 2^-1000.
pub const MAX_RESAMPLES: usize = 1000;

/// Picks the next "correct" element from a fixed pool.
///
/// Exclusion uses resample-until-different, which keeps the result uniform over
/// the remaining `pool_size - 1` values.
pub fn next_index<R: Rng + ?Sized>(
    rng: &mut R,
    pool_size: usize,
    exclude: Option<usize>,
) -> Result<usize, ConfigError> {
    if pool_size == 0 {
        return Err(ConfigError::EmptyPool);
    }

    let exclude = match exclude {
        Some(ex) if ex < pool_size => ex,
        // Nothing in the pool can collide with it.
        _ => return Ok(rng.gen_range(0..pool_size)),
    };

    if pool_size == 1 {
        return Err(ConfigError::UnsatisfiableExclusion { pool_size, exclude });
    }

    for _ in 0..MAX_RESAMPLES {
        let candidate = rng.gen_range(0..pool_size);
        if candidate != exclude {
            return Ok(candidate);
        }
    }

    Err(ConfigError::ResamplingExhausted {
        pool_size,
        exclude,
        attempts: MAX_RESAMPLES,
    })
}

/// Stateful wrapper remembering the last pick so consecutive targets differ.
#[derive(Debug, Clone)]
pub struct TargetSelector {
    pool_size: usize,
    last: Option<usize>,
}

impl TargetSelector {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            last: None,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Uniform first pick, with no exclusion.
    pub fn first<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, ConfigError> {
        let idx = next_index(rng, self.pool_size, None)?;
        self.last = Some(idx);
        Ok(idx)
    }

    /// A pick guaranteed to differ from the previous one.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, ConfigError> {
        let idx = next_index(rng, self.pool_size, self.last)?;
        self.last = Some(idx);
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn test_empty_pool_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(next_index(&mut rng, 0, None), Err(ConfigError::EmptyPool));
    }

    #[test]
    fn test_single_slot_with_exclusion_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            next_index(&mut rng, 1, Some(0)),
            Err(ConfigError::UnsatisfiableExclusion {
                pool_size: 1,
                exclude: 0
            })
        );
        assert_eq!(next_index(&mut rng, 1, None), Ok(0));
    }

    #[test]
    fn test_out_of_range_exclusion_is_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(next_index(&mut rng, 1, Some(7)), Ok(0));
    }

    #[test]
    fn test_distribution_is_close_to_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = 5;
        let exclude = 2;
        let trials = 40_000;
        let mut counts = [0usize; 5];

        for _ in 0..trials {
            counts[next_index(&mut rng, pool, Some(exclude)).unwrap()] += 1;
        }

        assert_eq!(counts[exclude], 0);
        let expected = trials as f64 / (pool - 1) as f64;
        for (idx, count) in counts.iter().enumerate() {
            if idx == exclude {
                continue;
            }
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "index {idx} drew {count}, expected ~{expected}");
        }
    }

    #[test]
    fn test_selector_never_repeats() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut selector = TargetSelector::new(2);
        let mut prev = selector.first(&mut rng).unwrap();
        for _ in 0..200 {
            let next = selector.next(&mut rng).unwrap();
            assert_ne!(next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_stuck_rng_is_an_error_not_a_panic() {
        // A constant zero stream always lands on index 0.
        let mut rng = StepRng::new(0, 0);
        assert_eq!(
            next_index(&mut rng, 4, Some(0)),
            Err(ConfigError::ResamplingExhausted {
                pool_size: 4,
                exclude: 0,
                attempts: MAX_RESAMPLES
            })
        );
        let mut selector = TargetSelector::new(4);
        assert_eq!(selector.first(&mut rng), Ok(0));
        assert!(selector.next(&mut rng).is_err());
    }

    #[test]
    fn test_shuffle_preserves_elements() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut items: Vec<u32> = (0..10).collect();
        items.shuffle(&mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_next_never_returns_excluded(
            pool in 2usize..64,
            seed in any::<u64>(),
            raw_ex in any::<usize>(),
        ) {
            let exclude = raw_ex % pool;
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..32 {
                let idx = next_index(&mut rng, pool, Some(exclude)).unwrap();
                prop_assert!(idx < pool);
                prop_assert_ne!(idx, exclude);
            }
        }
    }
}
