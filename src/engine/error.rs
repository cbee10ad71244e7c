//! Error types for the reduction engine.
//!
//! Every fallible operation in the crate returns [`ReduceResult`]. The variants
//! fall into three families:
//!
//! * **Preconditions** - empty input, undefined variance, invalid or uneven
//!   group sizes. These are surfaced immediately and never retried.
//! * **Device / offload failures** - adapter or device acquisition, kernel
//!   dispatch, read-back, unsupported element types. A failed pass aborts the
//!   statistic it belongs to; the engine neither retries nor falls back to a
//!   serial path.
//! * **Configuration and input** - config parsing, dataset parsing and I/O.
//!
//! ## Display vs. Debug
//! * `Display` messages are short and suitable for logs and CLI output.
//! * `Debug` (derived) keeps the full structure for diagnostics.
//!
//! ## Padding policy
//! There is no variant for an unsafe min/max padding value; the padding
//! normalizer never produces one.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ReduceResult<T> = Result<T, ReduceError>;

/// Aggregate error for reductions, backends, configuration and input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    /// No statistic is computable over an empty sequence.
    #[error("cannot reduce an empty sequence")]
    EmptyInput,

    /// Sample variance needs at least two elements (`N₀ - 1` divisor).
    #[error("variance is undefined for {count} element(s); at least 2 are required")]
    UndefinedVariance {
        /// Original element count.
        count: usize,
    },

    /// Group size below two never shrinks the working sequence.
    #[error("invalid group size {group_size}; must be at least 2")]
    InvalidGroupSize {
        /// Rejected group size.
        group_size: usize,
    },

    /// A kernel was handed an input that is not a whole number of groups.
    #[error("input length {len} is not a multiple of group size {group_size}")]
    UnevenGroups {
        /// Supplied input length.
        len: usize,

        /// Group size of the pass.
        group_size: usize,
    },

    /// The backend cannot run groups this large in one worker group.
    #[error("group size {group_size} exceeds the device workgroup limit {limit}")]
    GroupTooLarge {
        /// Requested group size.
        group_size: usize,

        /// Largest group the device supports.
        limit: usize,
    },

    /// The backend has no kernel for this element type.
    #[error("element type {element} is not supported by the {backend} backend")]
    UnsupportedElement {
        /// Element type name.
        element: &'static str,

        /// Backend name.
        backend: &'static str,
    },

    /// Adapter discovery or device creation failed.
    #[error("device error: {message}")]
    Device {
        /// Backend-provided detail.
        message: String,
    },

    /// A kernel invocation failed.
    #[error("kernel {kernel} failed: {message}")]
    Dispatch {
        /// Kernel name (`min_val`, `max_val`, `avg`, `std_dev`).
        kernel: &'static str,

        /// Backend-provided detail.
        message: String,
    },

    /// Copying pass results back to the host failed.
    #[error("read-back failed: {message}")]
    Readback {
        /// Backend-provided detail.
        message: String,
    },

    /// A shared runtime lock was poisoned by a panicking thread.
    #[error("lock poisoned: {what}")]
    LockPoisoned {
        /// Which lock.
        what: &'static str,
    },

    /// Configuration could not be parsed or is inconsistent.
    #[error("invalid configuration: {message}")]
    Config {
        /// Parser or validation detail.
        message: String,
    },

    /// A dataset token is not a number of the run's element type.
    #[error("token {index} ({token:?}) is not a valid number")]
    Parse {
        /// Zero-based token position.
        index: usize,

        /// Offending token.
        token: String,
    },

    /// Reading a file failed.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path being read.
        path: String,

        /// OS error detail.
        message: String,
    },
}

impl ReduceError {
    /// Shorthand for a dispatch failure of `kernel`.
    #[inline]
    pub fn dispatch(kernel: &'static str, message: impl Into<String>) -> Self {
        ReduceError::Dispatch { kernel, message: message.into() }
    }

    /// Returns `true` for errors caused by the caller's input rather than the
    /// backend.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ReduceError::EmptyInput
                | ReduceError::UndefinedVariance { .. }
                | ReduceError::InvalidGroupSize { .. }
                | ReduceError::UnevenGroups { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_single_line() {
        let e = ReduceError::UnevenGroups { len: 7, group_size: 5 };
        assert_eq!(e.to_string(), "input length 7 is not a multiple of group size 5");

        let e = ReduceError::UndefinedVariance { count: 1 };
        assert!(!e.to_string().contains('\n'));
    }

    #[test]
    fn precondition_classification() {
        assert!(ReduceError::EmptyInput.is_precondition());
        assert!(ReduceError::UndefinedVariance { count: 1 }.is_precondition());
        assert!(!ReduceError::dispatch("avg", "lost device").is_precondition());
    }
}
