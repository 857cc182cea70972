//! Seeded random sources
//!
//! Every random decision in the pipeline goes through a `ChaCha8Rng` seeded
//! from a `u64`. ChaCha output is specified independently of platform and
//! crate version, so identical seeds give identical datasets everywhere.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generator type used throughout the crate
pub type DatasetRng = ChaCha8Rng;

/// Create a generator from a seed
pub fn seeded(seed: u64) -> DatasetRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw a uniform index in `0..len`. `len` must be non-zero.
///
/// Sampled as `u64` so the value stream does not depend on pointer width.
pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    rng.gen_range(0..len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = seeded(7);
        let mut b = seeded(7);
        let xs: Vec<usize> = (0..32).map(|_| sample_index(&mut a, 1000)).collect();
        let ys: Vec<usize> = (0..32).map(|_| sample_index(&mut b, 1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_index_matches_u64_draw() {
        let mut a = seeded(3);
        let mut b = seeded(3);
        for len in [1usize, 2, 17, 1000, 1 << 20] {
            let expected = b.gen_range(0..len as u64) as usize;
            assert_eq!(sample_index(&mut a, len), expected);
        }
    }

    #[test]
    fn test_index_in_range() {
        let mut rng = seeded(0);
        for len in 1..50 {
            assert!(sample_index(&mut rng, len) < len);
        }
    }
}
