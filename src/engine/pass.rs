//! Multi-Pass Reduction Driver
//!
//! Repeatedly hands the whole working sequence to a [`GroupReducer`], replaces
//! it with the per-group partial results, and stops once the sequence fits in a
//! single group.
//!
//! ## Pass state
//!
//! The working sequence travels between passes as an explicit [`PassState`]
//! value, consumed and returned by [`PassState::advance`]. A state owns its
//! buffer outright; two statistic chains never share one, even when they start
//! from the same input slice.
//!
//! ## Loop
//!
//! ```text
//! pad(input) ──► pass ──► outputs (len / G) ──► len > G ? ──yes──► pad ──► pass ...
//!                                                 │
//!                                                 no
//!                                                 ▼
//!                                          serial finisher
//! ```
//!
//! * Every pass input is a whole number of groups; the residual handed to the
//!   serial finisher is *not* padded.
//! * After the first pass the operation switches to [`GroupOp::follow_up`], so
//!   the `std_dev` kernel squares raw elements exactly once.
//! * Each pass divides the length by `G >= 2` (rounding up), so the loop
//!   terminates in `O(log_G N)` passes.
//! * Passes are strictly sequential: pass `k + 1` reads pass `k`'s output. A
//!   failed pass aborts the chain; there is no retry.

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::finish::finish;
use crate::engine::kernel::{group_count, GroupOp, GroupReducer};
use crate::engine::padding::pad_in_place;
use crate::engine::types::{Element, GroupSize, Reduction};

/// Working sequence of one statistic chain between passes.
///
/// ## Invariants
/// * While `len() > group_size`, `buffer.len()` is a multiple of `group_size`
///   and the tail beyond `len()` holds neutral padding for `op`.
/// * Once terminal (`len() <= group_size`), `buffer.len() == len()`.

#[derive(Clone, Debug)]
pub struct PassState<T> {
    buffer: Vec<T>,
    len: usize,
    group_size: GroupSize,
    op: GroupOp<T>,
    passes: usize,
}

impl<T: Element> PassState<T> {
    /// Builds the initial state from the caller's input.
    ///
    /// The slice is copied, so the caller's data is never mutated and every
    /// chain gets its own buffer.
    ///
    /// ## Errors
    /// [`ReduceError::EmptyInput`] for an empty slice.
    pub fn new(values: &[T], group_size: GroupSize, op: GroupOp<T>) -> ReduceResult<Self> {
        if values.is_empty() {
            return Err(ReduceError::EmptyInput);
        }

        let mut buffer = Vec::with_capacity(values.len().div_ceil(group_size.get()) * group_size.get());
        buffer.extend_from_slice(values);
        if buffer.len() > group_size.get() {
            pad_in_place(&mut buffer, group_size, &op);
        }

        Ok(Self {
            buffer,
            len: values.len(),
            group_size,
            op,
            passes: 0,
        })
    }

    /// Logical (unpadded) length of the working sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; an empty state cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Group size of the chain.
    #[inline]
    pub fn group_size(&self) -> GroupSize {
        self.group_size
    }

    /// Number of groups the next pass would produce.
    #[inline]
    pub fn groups(&self) -> usize {
        self.buffer.len() / self.group_size.get()
    }

    /// Operation the next pass (or the serial finisher) applies.
    #[inline]
    pub fn op(&self) -> GroupOp<T> {
        self.op
    }

    /// Passes executed so far.
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Returns `true` once the sequence fits in a single group.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.len <= self.group_size.get()
    }

    /// Current buffer, including any padding.
    #[inline]
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    /// Runs one pass and returns the next state.
    ///
    /// ## Errors
    /// * Any error from the reducer.
    /// * [`ReduceError::Dispatch`] if the reducer returns the wrong number of
    ///   outputs.
    pub fn advance<R>(self, reducer: &R) -> ReduceResult<Self>
    where
        R: GroupReducer<T> + ?Sized,
    {
        let expected = group_count(self.buffer.len(), self.group_size)?;
        let kernel = self.op.kernel_name();

        tracing::debug!(
            backend = reducer.name(),
            kernel,
            pass = self.passes + 1,
            input_len = self.buffer.len(),
            groups = expected,
            "reduction pass"
        );

        let outputs = reducer.reduce_groups(self.op, &self.buffer, self.group_size)?;
        if outputs.len() != expected {
            return Err(ReduceError::dispatch(
                kernel,
                format!("expected {expected} group results, got {}", outputs.len()),
            ));
        }

        let op = self.op.follow_up();
        let mut buffer = outputs;
        if buffer.len() > self.group_size.get() {
            pad_in_place(&mut buffer, self.group_size, &op);
        }

        Ok(Self {
            buffer,
            len: expected,
            group_size: self.group_size,
            op,
            passes: self.passes + 1,
        })
    }

    /// Runs passes until the state is terminal.
    pub fn run<R>(mut self, reducer: &R) -> ReduceResult<Self>
    where
        R: GroupReducer<T> + ?Sized,
    {
        while !self.is_terminal() {
            self = self.advance(reducer)?;
        }
        Ok(self)
    }

    /// Splits a state into its pending operation and unpadded residual.
    pub fn into_residual(mut self) -> (GroupOp<T>, Vec<T>) {
        self.buffer.truncate(self.len);
        (self.op, self.buffer)
    }
}

/// Reduces `values` with `op` through the full multi-pass pipeline and the
/// serial finisher.
///
/// The returned value is the raw combined result (a sum for `avg` and
/// `std_dev`); dividing by `N₀` or `N₀ - 1` is the caller's job.
///
/// ## Errors
/// * [`ReduceError::EmptyInput`] for an empty slice.
/// * Any backend failure from a pass.
pub fn reduce_with<T, R>(
    reducer: &R,
    values: &[T],
    group_size: GroupSize,
    op: GroupOp<T>,
) -> ReduceResult<Reduction<T>>
where
    T: Element,
    R: GroupReducer<T> + ?Sized,
{
    let state = PassState::new(values, group_size, op)?.run(reducer)?;
    let passes = state.passes();
    let (pending, residual) = state.into_residual();
    let value = finish(&pending, &residual)?;
    Ok(Reduction { value, passes })
}
