//! Core Reduction Types
//!
//! This module defines the **numeric element model** and the small value types
//! shared by every stage of the reduction engine: padding, group kernels, the
//! multi-pass driver, the serial finisher and the statistics orchestrator.
//!
//! ## Element model
//!
//! A run reduces a sequence of exactly one element type. The engine is generic
//! over [`Element`], which is implemented for:
//!
//! - `i32`, `i64` - integer runs; arithmetic is wrapping, divisions truncate,
//! - `f32`, `f64` - floating-point runs; `min`/`max` follow IEEE semantics.
//!
//! Every statistic is reported in the element type of the run, so integer
//! means, variances and standard deviations are integer valued. For integers
//! the variance stage measures deviations from the *truncated* mean, so it can
//! exceed the truncated exact variance: `[0, 1]` has mean `0` and variance
//! `(0² + 1²) / 1 = 1`, not `trunc(0.5) = 0`.
//!
//! ## Group size
//!
//! [`GroupSize`] is validated once per run. A group size below two could never
//! shrink the working sequence, so it is rejected at construction instead of
//! being re-checked on every pass.
//!
//! ## Results
//!
//! - [`Reduction`] - one scalar plus the number of parallel passes it took,
//! - [`Statistics`] - the five-statistic summary of a sequence.

use std::fmt;

use bytemuck::Pod;
use serde::Serialize;

use crate::engine::error::{ReduceError, ReduceResult};

/// Numeric element reduced by the engine.
///
/// The arithmetic here is the arithmetic every backend must reproduce. The GPU
/// shaders mirror these operations in WGSL for the element types that WGSL can
/// express (see [`Element::WGSL_TYPE`]). Elements are plain old data so they
/// can be copied to and from device buffers byte for byte.

pub trait Element:
    Copy + Send + Sync + PartialOrd + Pod + fmt::Debug + fmt::Display + Serialize + 'static
{
    /// Additive identity, used as the sum padding value.
    const ZERO: Self;

    /// Short name used in diagnostics (`"f32"`, `"i64"`, ...).
    const NAME: &'static str;

    /// WGSL scalar type name, or `None` when no device shader can express it.
    const WGSL_TYPE: Option<&'static str>;

    /// Addition (wrapping for integers).
    fn add(self, rhs: Self) -> Self;

    /// Subtraction (wrapping for integers).
    fn sub(self, rhs: Self) -> Self;

    /// Multiplication (wrapping for integers).
    fn mul(self, rhs: Self) -> Self;

    /// Smaller of two values.
    fn min(self, rhs: Self) -> Self;

    /// Larger of two values.
    fn max(self, rhs: Self) -> Self;

    /// Divides by an element count (truncating for integers).
    fn div_count(self, count: usize) -> Self;

    /// Non-negative square root (exact floor for integers).
    fn sqrt(self) -> Self;

    /// Lossy widening used by logging and tolerance checks.
    fn to_f64(self) -> f64;

    /// Squared deviation from `mean`, the per-element term of the variance.
    #[inline]
    fn squared_deviation(self, mean: Self) -> Self {
        let d = self.sub(mean);
        d.mul(d)
    }
}

macro_rules! impl_integer_element {
    ($t:ty, $name:literal, $wgsl:expr) => {
        impl Element for $t {
            const ZERO: Self = 0;
            const NAME: &'static str = $name;
            const WGSL_TYPE: Option<&'static str> = $wgsl;

            #[inline]
            fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }

            #[inline]
            fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }

            #[inline]
            fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }

            #[inline]
            fn min(self, rhs: Self) -> Self { Ord::min(self, rhs) }

            #[inline]
            fn max(self, rhs: Self) -> Self { Ord::max(self, rhs) }

            #[inline]
            fn div_count(self, count: usize) -> Self {
                (self as i128 / count as i128) as $t
            }

            /// Floor of the square root; `0` for negative values.
            ///
            /// The `f64` estimate can be off by one above 2^53, so it is
            /// corrected in `i128`.
            #[inline]
            fn sqrt(self) -> Self {
                if self <= 0 {
                    return 0;
                }
                let n = self as i128;
                let mut r = (self as f64).sqrt() as i128;
                while r * r > n {
                    r -= 1;
                }
                while (r + 1) * (r + 1) <= n {
                    r += 1;
                }
                r as $t
            }

            #[inline]
            fn to_f64(self) -> f64 { self as f64 }
        }
    };
}

macro_rules! impl_float_element {
    ($t:ty, $name:literal, $wgsl:expr) => {
        impl Element for $t {
            const ZERO: Self = 0.0;
            const NAME: &'static str = $name;
            const WGSL_TYPE: Option<&'static str> = $wgsl;

            #[inline]
            fn add(self, rhs: Self) -> Self { self + rhs }

            #[inline]
            fn sub(self, rhs: Self) -> Self { self - rhs }

            #[inline]
            fn mul(self, rhs: Self) -> Self { self * rhs }

            #[inline]
            fn min(self, rhs: Self) -> Self { <$t>::min(self, rhs) }

            #[inline]
            fn max(self, rhs: Self) -> Self { <$t>::max(self, rhs) }

            #[inline]
            fn div_count(self, count: usize) -> Self { self / count as $t }

            #[inline]
            fn sqrt(self) -> Self { <$t>::sqrt(self) }

            #[inline]
            fn to_f64(self) -> f64 { self as f64 }
        }
    };
}

impl_integer_element!(i32, "i32", Some("i32"));
impl_integer_element!(i64, "i64", None);
impl_float_element!(f32, "f32", Some("f32"));
impl_float_element!(f64, "f64", None);

/// Number of elements one worker group reduces to a single output.
///
/// ## Invariants
/// * `get() >= 2`, so every pass strictly shrinks the working sequence and the
///   driver terminates after at most `ceil(log_G(N))` passes.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupSize(usize);

impl GroupSize {
    /// Validates and wraps a group size.
    ///
    /// ## Errors
    /// Returns [`ReduceError::InvalidGroupSize`] for `0` and `1`.
    pub fn new(group_size: usize) -> ReduceResult<Self> {
        if group_size < 2 {
            return Err(ReduceError::InvalidGroupSize { group_size });
        }
        Ok(Self(group_size))
    }

    /// Returns the raw group size.
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for GroupSize {
    type Error = ReduceError;

    fn try_from(value: usize) -> ReduceResult<Self> {
        Self::new(value)
    }
}

/// A single reduced scalar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reduction<T> {
    /// Final value after the serial finish (and any division by `N₀`).
    pub value: T,

    /// Number of parallel passes executed before the serial finish.
    pub passes: usize,
}

/// Five-statistic summary of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Statistics<T> {
    /// Original (unpadded) element count `N₀`.
    pub count: usize,

    /// Smallest element.
    pub min: T,

    /// Largest element.
    pub max: T,

    /// Arithmetic mean, `sum / N₀`.
    pub mean: T,

    /// Unbiased sample variance, `Σ(x - mean)² / (N₀ - 1)`; `None` when
    /// `N₀ == 1`.
    pub variance: Option<T>,

    /// Standard deviation, `sqrt(variance)`; `None` when `N₀ == 1`.
    pub std_dev: Option<T>,
}

impl<T: Element> fmt::Display for Statistics<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count    = {}", self.count)?;
        writeln!(f, "min      = {}", self.min)?;
        writeln!(f, "max      = {}", self.max)?;
        writeln!(f, "mean     = {}", self.mean)?;
        writeln!(f, "variance = {}", Undefined(self.variance))?;
        write!(f, "std_dev  = {}", Undefined(self.std_dev))
    }
}

/// Displays `None` as `undefined`.
struct Undefined<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Undefined<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("undefined (needs at least 2 values)"),
        }
    }
}
