//! # GPU Execution Backend
//!
//! Runs reduction passes as `wgpu` compute shaders. The backend is an
//! optional, feature-gated extension (`feature = "gpu"`); the CPU backend
//! computes the same statistics without it.
//!
//! ## Execution model
//!
//! One pass is one dispatch of `groups` workgroups with `G` invocations each:
//!
//! 1. **Upload** - the padded pass input is written to a storage buffer.
//! 2. **Dispatch** - each workgroup loads its group into workgroup memory and
//!    folds it with a barrier-separated tree; invocation 0 writes the result.
//! 3. **Synchronization** - the host waits on `wgpu::Device::poll`.
//! 4. **Download** - per-group outputs are copied to a staging buffer and
//!    mapped back to the host, where the driver pads them for the next pass.
//!
//! Kernels are generated per element type and group size and cached per
//! device, so only the first pass of a given kernel pays compilation.
//!
//! ## Module structure
//!
//! * [`context`] - adapter discovery and device creation
//! * [`shaders`] - WGSL generation for `min_val`, `max_val`, `avg`, `std_dev`
//! * [`pipeline`] - compute pipeline creation and caching
//! * [`dispatch`] - [`GpuReducer`], the pass-level entry point
//!
//! ## Limits
//!
//! * Only `f32` and `i32` have WGSL counterparts; `f64` and `i64` runs fail
//!   with [`UnsupportedElement`](crate::ReduceError::UnsupportedElement).
//! * `G` may not exceed the device's per-workgroup invocation limit
//!   ([`GroupTooLarge`](crate::ReduceError::GroupTooLarge)).

#![cfg(feature = "gpu")]

mod context;
mod dispatch;
mod pipeline;
mod shaders;

pub use context::{list_adapters, AdapterSummary};
pub use dispatch::{GpuReducer, KernelParams};
pub use shaders::generate_kernel;
