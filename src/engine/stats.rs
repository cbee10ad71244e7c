//! Statistics orchestration.
//!
//! Builds the five aggregate statistics on top of the multi-pass driver:
//!
//! * [`min`] / [`max`] - one `min_val` / `max_val` chain each,
//! * [`mean`] - one `avg` chain, divided by `N₀`,
//! * [`variance`] - the two-stage chain below,
//! * [`std_dev`] - `sqrt(variance)`,
//! * [`summarize`] - all five, reusing the resolved mean for the variance.
//!
//! ## Variance stages
//!
//! 1. **Mean stage** - sum the padded original through the `avg` kernel and
//!    divide by `N₀`. The variance stage cannot start before this resolves.
//! 2. **Variance stage** - re-pad the *original* input (never a stage-1
//!    buffer), run `std_dev(mean)` for the first pass and `avg` thereafter,
//!    finish with a sum and divide by `N₀ - 1`.
//!
//! ## Chains and failures
//! Each statistic owns a private working-buffer lineage built from the same
//! borrowed input. A failure in one chain is returned to the caller of that
//! statistic only; [`summarize`] stops at the first failure because it returns
//! all five together.
//!
//! ## Errors
//! * [`ReduceError::EmptyInput`] - every statistic over an empty sequence.
//! * [`ReduceError::UndefinedVariance`] - variance and standard deviation over
//!   a single element.

use tracing::info_span;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::finish::{mean_of_sum, variance_of_sum};
use crate::engine::kernel::{GroupOp, GroupReducer};
use crate::engine::pass::reduce_with;
use crate::engine::types::{Element, GroupSize, Reduction, Statistics};

/// Minimum of `values`.
pub fn min<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    let _span = info_span!("reduce", stat = "min", len = values.len(), %group_size).entered();
    reduce_with(reducer, values, group_size, GroupOp::Min)
}

/// Maximum of `values`.
pub fn max<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    let _span = info_span!("reduce", stat = "max", len = values.len(), %group_size).entered();
    reduce_with(reducer, values, group_size, GroupOp::Max)
}

/// Arithmetic mean of `values` (sum divided by `N₀`).
pub fn mean<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    let _span = info_span!("reduce", stat = "mean", len = values.len(), %group_size).entered();
    let sum = reduce_with(reducer, values, group_size, GroupOp::Sum)?;
    Ok(Reduction {
        value: mean_of_sum(sum.value, values.len())?,
        passes: sum.passes,
    })
}

/// Variance stage only: unbiased sample variance around a known `mean`.
///
/// `passes` counts the variance-stage passes only.
pub fn variance_with_mean<T, R>(
    reducer: &R,
    values: &[T],
    group_size: GroupSize,
    mean: T,
) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    match values.len() {
        0 => return Err(ReduceError::EmptyInput),
        1 => return Err(ReduceError::UndefinedVariance { count: 1 }),
        _ => {}
    }

    let _span = info_span!("reduce", stat = "variance", len = values.len(), %group_size).entered();
    let sum_sq = reduce_with(reducer, values, group_size, GroupOp::SquaredDeviation { mean })?;
    Ok(Reduction {
        value: variance_of_sum(sum_sq.value, values.len())?,
        passes: sum_sq.passes,
    })
}

/// Unbiased sample variance of `values`.
///
/// Runs the mean stage, then the variance stage. `passes` is the total over
/// both stages.
pub fn variance<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    if values.len() == 1 {
        return Err(ReduceError::UndefinedVariance { count: 1 });
    }

    let m = mean(reducer, values, group_size)?;
    let v = variance_with_mean(reducer, values, group_size, m.value)?;
    Ok(Reduction {
        value: v.value,
        passes: m.passes + v.passes,
    })
}

/// Standard deviation of `values`, `sqrt(variance)`.
pub fn std_dev<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    let v = variance(reducer, values, group_size)?;
    Ok(Reduction {
        value: v.value.sqrt(),
        passes: v.passes,
    })
}

/// All five statistics of `values`.
///
/// The mean is computed once and fed into the variance stage. A single value
/// still yields its min, max and mean; variance and standard deviation are
/// then `None`.
///
/// ## Errors
/// [`ReduceError::EmptyInput`] for an empty slice, or any backend error.
pub fn summarize<T, R>(reducer: &R, values: &[T], group_size: GroupSize) -> ReduceResult<Statistics<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    if values.is_empty() {
        return Err(ReduceError::EmptyInput);
    }

    let min = min(reducer, values, group_size)?.value;
    let max = max(reducer, values, group_size)?.value;
    let mean = mean(reducer, values, group_size)?.value;
    let variance = match variance_with_mean(reducer, values, group_size, mean) {
        Ok(v) => Some(v.value),
        Err(ReduceError::UndefinedVariance { count }) => {
            tracing::debug!(count, "variance undefined, reporting the remaining statistics");
            None
        }
        Err(e) => return Err(e),
    };

    let stats = Statistics {
        count: values.len(),
        min,
        max,
        mean,
        variance,
        std_dev: variance.map(Element::sqrt),
    };

    tracing::info!(
        backend = reducer.name(),
        element = T::NAME,
        count = stats.count,
        min = stats.min.to_f64(),
        max = stats.max.to_f64(),
        mean = stats.mean.to_f64(),
        variance = stats.variance.map(Element::to_f64),
        "statistics resolved"
    );

    Ok(stats)
}

/// A reduction backend bound to a group size.
///
/// ## Role
/// Convenience façade over the free functions of this module for callers that
/// reduce many sequences with one configuration.
///
/// ```
/// use group_reduce::{CpuReducer, GroupSize, Reducer};
///
/// let reducer = Reducer::new(CpuReducer::new(), GroupSize::new(5)?);
/// let stats = reducer.summarize(&[1.0f64, 1.0, 1.0, 3.0, -3.0, -1.0, 1.0, 1.0, 1.0, 1.0])?;
/// assert_eq!(stats.min, -3.0);
/// assert_eq!(stats.max, 3.0);
/// # Ok::<(), group_reduce::ReduceError>(())
/// ```

#[derive(Debug)]
pub struct Reducer<B> {
    backend: B,
    group_size: GroupSize,
}

impl<B> Reducer<B> {
    /// Binds `backend` to `group_size`.
    pub fn new(backend: B, group_size: GroupSize) -> Self {
        Self { backend, group_size }
    }

    /// Group size every pass uses.
    pub fn group_size(&self) -> GroupSize {
        self.group_size
    }

    /// Underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// See [`min`].
    pub fn min<T: Element>(&self, values: &[T]) -> ReduceResult<T>
    where
        B: GroupReducer<T>,
    {
        min(&self.backend, values, self.group_size).map(|r| r.value)
    }

    /// See [`max`].
    pub fn max<T: Element>(&self, values: &[T]) -> ReduceResult<T>
    where
        B: GroupReducer<T>,
    {
        max(&self.backend, values, self.group_size).map(|r| r.value)
    }

    /// See [`mean`].
    pub fn mean<T: Element>(&self, values: &[T]) -> ReduceResult<T>
    where
        B: GroupReducer<T>,
    {
        mean(&self.backend, values, self.group_size).map(|r| r.value)
    }

    /// See [`variance`].
    pub fn variance<T: Element>(&self, values: &[T]) -> ReduceResult<T>
    where
        B: GroupReducer<T>,
    {
        variance(&self.backend, values, self.group_size).map(|r| r.value)
    }

    /// See [`std_dev`].
    pub fn std_dev<T: Element>(&self, values: &[T]) -> ReduceResult<T>
    where
        B: GroupReducer<T>,
    {
        std_dev(&self.backend, values, self.group_size).map(|r| r.value)
    }

    /// See [`summarize`].
    pub fn summarize<T: Element>(&self, values: &[T]) -> ReduceResult<Statistics<T>>
    where
        B: GroupReducer<T>,
    {
        summarize(&self.backend, values, self.group_size)
    }
}
