//! Padding Normalizer
//!
//! Extends a working sequence to a whole number of groups with values that
//! cannot change the result of the kernel that will consume them.
//!
//! ## Policy
//!
//! | operation           | padding value                       |
//! |---------------------|-------------------------------------|
//! | `avg` (sum)         | `0`                                 |
//! | `min_val`/`max_val` | replica of the last real element    |
//! | `std_dev(mean)`     | `mean` (its squared deviation is 0) |
//!
//! Zero is only neutral for sums: a zero appended to an all-positive sequence
//! would become its minimum. A replica of an element already present can tie
//! with the true extremum but can never beat it, so min/max stay exact for any
//! data. The same policy is re-applied to intermediate partial results on every
//! pass.
//!
//! Padding never touches the original element count `N₀`; callers keep it
//! separately for the final divisions.

use crate::engine::kernel::GroupOp;
use crate::engine::types::{Element, GroupSize};

/// Smallest multiple of `group_size` that is `>= len`.
#[inline]
pub fn padded_len(len: usize, group_size: GroupSize) -> usize {
    len.div_ceil(group_size.get()) * group_size.get()
}

/// Neutral padding value for `op` over `values`.
///
/// Returns `None` when no neutral value exists, i.e. min/max over an empty
/// sequence.
pub fn padding_value<T: Element>(op: &GroupOp<T>, values: &[T]) -> Option<T> {
    match op {
        GroupOp::Sum => Some(T::ZERO),
        GroupOp::SquaredDeviation { mean } => Some(*mean),
        GroupOp::Min | GroupOp::Max => values.last().copied(),
    }
}

/// Pads an owned buffer in place up to [`padded_len`].
///
/// Returns the number of elements appended. An empty buffer is left empty.
pub fn pad_in_place<T: Element>(values: &mut Vec<T>, group_size: GroupSize, op: &GroupOp<T>) -> usize {
    let target = padded_len(values.len(), group_size);
    let missing = target - values.len();
    if missing == 0 {
        return 0;
    }

    match padding_value(op, values) {
        Some(fill) => {
            values.resize(target, fill);
            tracing::trace!(
                kernel = op.kernel_name(),
                appended = missing,
                len = target,
                "padded working sequence"
            );
            missing
        }
        None => 0,
    }
}

/// Returns a padded copy of `values`.
pub fn pad_to_group<T: Element>(values: &[T], group_size: GroupSize, op: &GroupOp<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(padded_len(values.len(), group_size));
    out.extend_from_slice(values);
    pad_in_place(&mut out, group_size, op);
    out
}
