//! Train/test splitting
//!
//! Two flavours are provided: a seeded shuffle for regressors that learn from
//! calendar features, and a chronological holdout for models that consume the
//! series in order.

use crate::{MathError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Number of test items for a given length and ratio, validated so both sides are non-empty
pub fn test_size(len: usize, test_ratio: f64) -> Result<usize> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Test ratio must be between 0 and 1, got {}",
            test_ratio
        )));
    }

    let test = (len as f64 * test_ratio).ceil() as usize;
    if len < 2 || test == 0 || test >= len {
        return Err(MathError::InsufficientData(format!(
            "Need at least one training and one test sample, got {} samples",
            len
        )));
    }

    Ok(test)
}

/// Shuffle `0..len` with a fixed seed and split it into (train, test) indices
pub fn shuffled_split_indices(
    len: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let test = test_size(len, test_ratio)?;

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test);
    Ok((train, indices))
}

/// Split an ordered slice so the most recent items form the test set
pub fn chronological_split<T>(values: &[T], test_ratio: f64) -> Result<(&[T], &[T])> {
    let test = test_size(values.len(), test_ratio)?;
    Ok(values.split_at(values.len() - test))
}

/// Pick the items at the given indices
pub fn take<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10, 0.2, 2)]
    #[case(11, 0.2, 3)]
    #[case(5, 0.2, 1)]
    #[case(2, 0.5, 1)]
    fn test_test_size_rounds_up(#[case] len: usize, #[case] ratio: f64, #[case] expected: usize) {
        assert_eq!(test_size(len, ratio).unwrap(), expected);
    }

    #[test]
    fn test_shuffled_split_is_reproducible() {
        let (train_a, test_a) = shuffled_split_indices(20, 0.2, 42).unwrap();
        let (train_b, test_b) = shuffled_split_indices(20, 0.2, 42).unwrap();

        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(train_a.len(), 16);
        assert_eq!(test_a.len(), 4);

        let mut all: Vec<usize> = train_a.iter().chain(test_a.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_chronological_split_keeps_order() {
        let values = [1, 2, 3, 4, 5];
        let (train, test) = chronological_split(&values, 0.4).unwrap();
        assert_eq!(train, &[1, 2, 3]);
        assert_eq!(test, &[4, 5]);
    }

    #[test]
    fn test_split_errors() {
        assert!(matches!(
            shuffled_split_indices(1, 0.2, 42),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            shuffled_split_indices(10, 1.0, 42),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            chronological_split(&[1.0, 2.0], 0.0),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_take() {
        let values = ["a", "b", "c"];
        assert_eq!(take(&values, &[2, 0]), vec!["c", "a"]);
    }
}
