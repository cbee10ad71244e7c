//! Serial Finisher
//!
//! Host-side fold of the residual sequence left after the last parallel pass.
//! The parallel reduction bottoms out at one group (`<= G` values), not one
//! value, so every statistic ends here.
//!
//! The residual is folded with the *pending* operation of the chain:
//! * after at least one pass this is the follow-up operation (a plain sum for
//!   the variance chain),
//! * when the input was already at most one group long, no pass ran and the
//!   pending operation is still the original kernel, e.g. `std_dev(mean)`,
//!   which squares the raw elements here instead.
//!
//! Divisions by `N₀` (mean) and `N₀ - 1` (variance) are applied by the
//! statistics orchestrator after this fold.

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::kernel::GroupOp;
use crate::engine::types::Element;

/// Folds `residual` into one scalar with `op`.
///
/// ## Errors
/// [`ReduceError::EmptyInput`] for an empty residual.
pub fn finish<T: Element>(op: &GroupOp<T>, residual: &[T]) -> ReduceResult<T> {
    op.fold_group(residual).ok_or(ReduceError::EmptyInput)
}

/// Divides a finished sum by the original element count.
///
/// ## Errors
/// [`ReduceError::EmptyInput`] when `count == 0`.
pub fn mean_of_sum<T: Element>(sum: T, count: usize) -> ReduceResult<T> {
    if count == 0 {
        return Err(ReduceError::EmptyInput);
    }
    Ok(sum.div_count(count))
}

/// Divides a finished sum of squared deviations by `count - 1`.
///
/// ## Errors
/// [`ReduceError::UndefinedVariance`] when `count < 2`.
pub fn variance_of_sum<T: Element>(sum_sq: T, count: usize) -> ReduceResult<T> {
    if count < 2 {
        return Err(ReduceError::UndefinedVariance { count });
    }
    Ok(sum_sq.div_count(count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_uses_matching_combinator() {
        let residual = [2.0f64, -3.5, 7.25];
        assert_eq!(finish(&GroupOp::Min, &residual), Ok(-3.5));
        assert_eq!(finish(&GroupOp::Max, &residual), Ok(7.25));
        assert_eq!(finish(&GroupOp::Sum, &residual), Ok(5.75));
    }

    #[test]
    fn finish_squares_raw_elements_when_no_pass_ran() {
        let residual = [1.0f64, 2.0, 3.0];
        assert_eq!(finish(&GroupOp::SquaredDeviation { mean: 2.0 }, &residual), Ok(2.0));
    }

    #[test]
    fn empty_residual_is_an_error() {
        assert_eq!(finish::<i32>(&GroupOp::Sum, &[]), Err(ReduceError::EmptyInput));
    }

    #[test]
    fn divisors_are_guarded() {
        assert_eq!(mean_of_sum(40, 10), Ok(4));
        assert_eq!(mean_of_sum(1.0f32, 0), Err(ReduceError::EmptyInput));
        assert_eq!(variance_of_sum(22.5f64, 10), Ok(2.5));
        assert_eq!(
            variance_of_sum(0.0f64, 1),
            Err(ReduceError::UndefinedVariance { count: 1 })
        );
    }
}
