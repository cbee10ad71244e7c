//! CPU parallel backend.
//!
//! Executes each reduction pass on a Rayon thread pool. Every group of a pass
//! is an independent task, mirroring one device workgroup:
//!
//! 1. the group's inputs are loaded (and transformed, for `std_dev`) into a
//!    per-task scratch buffer of `G` values,
//! 2. the scratch is folded with the same stride-doubling tree the WGSL
//!    kernels use ([`tree_fold`]),
//! 3. lane 0 becomes the group's output.
//!
//! Groups never communicate and their completion order is unspecified; the
//! output order is fixed by `par_chunks_exact`, which keeps group `k` at index
//! `k`. Scratch buffers are reused per worker via `map_init`.
//!
//! By default the global Rayon pool is used. [`CpuReducer::with_threads`]
//! builds a dedicated pool instead.

use rayon::prelude::*;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::kernel::{group_count, tree_fold, GroupOp, GroupReducer};
use crate::engine::types::{Element, GroupSize};

/// Rayon-backed [`GroupReducer`].
#[derive(Debug, Default)]
pub struct CpuReducer {
    pool: Option<rayon::ThreadPool>,
}

impl CpuReducer {
    /// Creates a reducer that runs on the global Rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reducer with a dedicated pool of `threads` workers.
    ///
    /// ## Errors
    /// [`ReduceError::Config`] if `threads == 0` or the pool cannot be built.
    pub fn with_threads(threads: usize) -> ReduceResult<Self> {
        if threads == 0 {
            return Err(ReduceError::Config {
                message: "cpu backend needs at least one thread".into(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("group-reduce-{i}"))
            .build()
            .map_err(|e| ReduceError::Config {
                message: format!("failed to build thread pool: {e}"),
            })?;

        Ok(Self { pool: Some(pool) })
    }

    /// Number of worker threads passes run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

impl<T: Element> GroupReducer<T> for CpuReducer {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn reduce_groups(
        &self,
        op: GroupOp<T>,
        input: &[T],
        group_size: GroupSize,
    ) -> ReduceResult<Vec<T>> {
        let groups = group_count(input.len(), group_size)?;
        if groups == 0 {
            return Ok(Vec::new());
        }

        let g = group_size.get();
        let outputs: Option<Vec<T>> = self.install(|| {
            input
                .par_chunks_exact(g)
                .map_init(
                    || Vec::with_capacity(g),
                    |scratch: &mut Vec<T>, group| {
                        scratch.clear();
                        scratch.extend(group.iter().map(|&x| op.load(x)));
                        tree_fold(&op, scratch)
                    },
                )
                .collect()
        });

        outputs.ok_or_else(|| ReduceError::dispatch(op.kernel_name(), "empty group in pass"))
    }
}
