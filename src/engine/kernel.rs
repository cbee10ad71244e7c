//! Group Reduction Kernel Set
//!
//! This module defines the four **per-group reduction kernels** and the
//! [`GroupReducer`] seam behind which backends execute them.
//!
//! ## Kernel contracts
//!
//! Every kernel reads `len` inputs, where `len` is a multiple of the group size
//! `G`, and writes exactly `len / G` outputs. Output `k` depends only on the
//! contiguous inputs `k*G .. (k+1)*G`:
//!
//! | kernel     | [`GroupOp`]                    | output for one group      |
//! |------------|--------------------------------|---------------------------|
//! | `min_val`  | [`GroupOp::Min`]               | minimum of the group      |
//! | `max_val`  | [`GroupOp::Max`]               | maximum of the group      |
//! | `avg`      | [`GroupOp::Sum`]               | sum of the group          |
//! | `std_dev`  | [`GroupOp::SquaredDeviation`]  | `Σ (x - mean)²`           |
//!
//! The `avg` kernel only sums; division by `N₀` happens once, after the serial
//! finish. `std_dev` squares deviations on load, so it must only ever see raw
//! elements: once a pass has produced partial sums of squares, the driver
//! switches to [`GroupOp::follow_up`] (plain `avg`).
//!
//! ## Load / combine decomposition
//!
//! Each kernel is expressed as a `load` applied to every input element followed
//! by an associative `combine` folded over the group. Backends are free to
//! fold in any tree shape; [`tree_fold`] is the shared-scratch pattern used by
//! both the CPU backend and the generated WGSL shaders.
//!
//! ## Backends
//!
//! A [`GroupReducer`] executes one pass. It must:
//! * reject inputs that are not a whole number of groups
//!   ([`ReduceError::UnevenGroups`]),
//! * return one output per group, in group order,
//! * report failures instead of producing partial output.

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::types::{Element, GroupSize};

/// Reduction applied to each group of a pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GroupOp<T> {
    /// `min_val`
    Min,

    /// `max_val`
    Max,

    /// `avg` (group sum)
    Sum,

    /// `std_dev`: sum of squared deviations from an already resolved mean.
    SquaredDeviation {
        /// Mean produced by the mean stage.
        mean: T,
    },
}

impl<T: Element> GroupOp<T> {
    /// Kernel entry-point name.
    pub fn kernel_name(&self) -> &'static str {
        match self {
            GroupOp::Min => "min_val",
            GroupOp::Max => "max_val",
            GroupOp::Sum => "avg",
            GroupOp::SquaredDeviation { .. } => "std_dev",
        }
    }

    /// Operation used for every pass after the first.
    ///
    /// Partial results of `std_dev` are already sums of squares, so later
    /// passes must sum them rather than square them again.
    #[inline]
    pub fn follow_up(self) -> Self {
        match self {
            GroupOp::SquaredDeviation { .. } => GroupOp::Sum,
            op => op,
        }
    }

    /// Mean parameter of the `std_dev` kernel, `ZERO` for the others.
    #[inline]
    pub fn mean_param(&self) -> T {
        match self {
            GroupOp::SquaredDeviation { mean } => *mean,
            _ => T::ZERO,
        }
    }

    /// Per-element transform applied as an input is loaded into scratch.
    #[inline]
    pub fn load(&self, x: T) -> T {
        match self {
            GroupOp::SquaredDeviation { mean } => x.squared_deviation(*mean),
            _ => x,
        }
    }

    /// Associative combinator folded over loaded values.
    #[inline]
    pub fn combine(&self, a: T, b: T) -> T {
        match self {
            GroupOp::Min => a.min(b),
            GroupOp::Max => a.max(b),
            GroupOp::Sum | GroupOp::SquaredDeviation { .. } => a.add(b),
        }
    }

    /// Sequential reference fold of one group.
    ///
    /// Returns `None` only for an empty slice.
    pub fn fold_group(&self, group: &[T]) -> Option<T> {
        group
            .iter()
            .map(|&x| self.load(x))
            .reduce(|a, b| self.combine(a, b))
    }
}

/// Folds `scratch` in place with the stride-doubling tree used by device
/// kernels and returns the group result in `scratch[0]`.
///
/// At step `s` (1, 2, 4, ...) lane `i` with `i % 2s == 0` absorbs lane `i + s`
/// when that lane exists, so groups need not be a power of two long.
///
/// Returns `None` for an empty scratch slice.
pub fn tree_fold<T: Element>(op: &GroupOp<T>, scratch: &mut [T]) -> Option<T> {
    let n = scratch.len();
    if n == 0 {
        return None;
    }

    let mut stride = 1;
    while stride < n {
        let mut lane = 0;
        while lane + stride < n {
            scratch[lane] = op.combine(scratch[lane], scratch[lane + stride]);
            lane += 2 * stride;
        }
        stride *= 2;
    }

    Some(scratch[0])
}

/// Validates a pass input and returns its group count.
///
/// ## Errors
/// [`ReduceError::UnevenGroups`] when `len` is not a multiple of `group_size`.
#[inline]
pub fn group_count(len: usize, group_size: GroupSize) -> ReduceResult<usize> {
    let g = group_size.get();
    if len % g != 0 {
        return Err(ReduceError::UnevenGroups { len, group_size: g });
    }
    Ok(len / g)
}

/// Executes one reduction pass.
///
/// ## Role
/// This is the kernel-hosting collaborator of the multi-pass driver: the
/// driver hands it the whole working sequence and receives one value per
/// group. From the driver's perspective the call is synchronous even though
/// groups run in parallel underneath.
///
/// ## Contract
/// * `input.len()` must be a multiple of `group_size`.
/// * The returned vector has length `input.len() / group_size` and element `k`
///   is `op` applied to group `k`.
/// * An empty input returns an empty output.

pub trait GroupReducer<T: Element>: Send + Sync {
    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Reduces every group of `input` with `op`.
    fn reduce_groups(
        &self,
        op: GroupOp<T>,
        input: &[T],
        group_size: GroupSize,
    ) -> ReduceResult<Vec<T>>;
}

impl<T: Element, R: GroupReducer<T> + ?Sized> GroupReducer<T> for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reduce_groups(
        &self,
        op: GroupOp<T>,
        input: &[T],
        group_size: GroupSize,
    ) -> ReduceResult<Vec<T>> {
        (**self).reduce_groups(op, input, group_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_names_match_device_entry_points() {
        assert_eq!(GroupOp::<f32>::Min.kernel_name(), "min_val");
        assert_eq!(GroupOp::<f32>::Max.kernel_name(), "max_val");
        assert_eq!(GroupOp::<f32>::Sum.kernel_name(), "avg");
        assert_eq!(GroupOp::SquaredDeviation { mean: 1.0f32 }.kernel_name(), "std_dev");
    }

    #[test]
    fn squared_deviation_follows_up_with_sum() {
        assert_eq!(GroupOp::SquaredDeviation { mean: 2.0f64 }.follow_up(), GroupOp::Sum);
        assert_eq!(GroupOp::<f64>::Min.follow_up(), GroupOp::Min);
        assert_eq!(GroupOp::<f64>::Max.follow_up(), GroupOp::Max);
        assert_eq!(GroupOp::<f64>::Sum.follow_up(), GroupOp::Sum);
    }

    #[test]
    fn fold_group_contracts() {
        let group = [3, 2, 5, -1, 13];
        assert_eq!(GroupOp::Min.fold_group(&group), Some(-1));
        assert_eq!(GroupOp::Max.fold_group(&group), Some(13));
        assert_eq!(GroupOp::Sum.fold_group(&group), Some(22));
        // deviations from 4: -1, -2, 1, -5, 9
        assert_eq!(GroupOp::SquaredDeviation { mean: 4 }.fold_group(&group), Some(112));
        assert_eq!(GroupOp::<i32>::Sum.fold_group(&[]), None);
    }

    #[test]
    fn tree_fold_handles_non_power_of_two_groups() {
        for n in 1..=17usize {
            let values: Vec<i64> = (1..=n as i64).collect();
            let mut scratch = values.clone();
            assert_eq!(
                tree_fold(&GroupOp::Sum, &mut scratch),
                Some(values.iter().sum::<i64>()),
                "n = {n}"
            );

            let mut scratch: Vec<i64> = values.iter().rev().copied().collect();
            assert_eq!(tree_fold(&GroupOp::Min, &mut scratch), Some(1), "n = {n}");
        }
        assert_eq!(tree_fold::<f32>(&GroupOp::Max, &mut []), None);
    }

    #[test]
    fn group_count_requires_whole_groups() {
        let g = GroupSize::new(5).unwrap();
        assert_eq!(group_count(10, g), Ok(2));
        assert_eq!(group_count(0, g), Ok(0));
        assert_eq!(
            group_count(12, g),
            Err(ReduceError::UnevenGroups { len: 12, group_size: 5 })
        );
    }
}
