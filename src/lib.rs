//! # Group Reduce
//!
//! Multi-pass parallel group reduction of large numeric sequences into five
//! aggregate statistics: minimum, maximum, mean, sample variance and standard
//! deviation.
//!
//! ## Execution model
//! - The input is padded with an operation-neutral value to a multiple of the
//!   group size `G`
//! - Each parallel pass reduces every group of `G` elements to one value
//! - Passes repeat until at most `G` values remain; the host folds the rest
//! - Variance runs a mean stage first, then a squared-deviation stage over the
//!   original input
//!
//! ## Backends
//! - [`CpuReducer`] - Rayon worker pool (always available)
//! - `GpuReducer` - `wgpu` compute shaders (`feature = "gpu"`)
//!
//! Both implement [`GroupReducer`] and produce the same statistics up to
//! floating-point reassociation.
//!
//! ```
//! use group_reduce::{CpuReducer, GroupSize, Reducer};
//!
//! let reducer = Reducer::new(CpuReducer::new(), GroupSize::new(5)?);
//! let data = [3, 2, 5, -1, 13, -7, 21, -5, 0, 9];
//! assert_eq!(reducer.min(&data)?, -7);
//! assert_eq!(reducer.max(&data)?, 21);
//! assert_eq!(reducer.mean(&data)?, 4);
//! # Ok::<(), group_reduce::ReduceError>(())
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![allow(clippy::module_inception)]

pub mod engine;
pub mod gpu;

pub mod backend;
pub mod config;
pub mod dataset;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::types::{
    Element,
    GroupSize,
    Reduction,
    Statistics,
};

pub use engine::error::{
    ReduceError,
    ReduceResult,
};

pub use engine::kernel::{
    GroupOp,
    GroupReducer,
};

pub use engine::padding::{pad_to_group, padded_len};
pub use engine::pass::{reduce_with, PassState};
pub use engine::cpu::CpuReducer;

pub use engine::stats::{
    min,
    max,
    mean,
    variance,
    variance_with_mean,
    std_dev,
    summarize,
    Reducer,
};

pub use backend::AnyReducer;
pub use config::{Backend, ReduceConfig};

#[cfg(feature = "gpu")]
pub use gpu::{list_adapters, AdapterSummary, GpuReducer};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Common imports for computing statistics.
///
/// ```rust
/// use group_reduce::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AnyReducer,
        CpuReducer,
        Element,
        GroupReducer,
        GroupSize,
        ReduceConfig,
        ReduceError,
        ReduceResult,
        Reducer,
        Statistics,
    };
}
