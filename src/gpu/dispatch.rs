//! # GPU Dispatch Runtime
//!
//! The bridge between the pass driver and the device. Each call to
//! [`GpuReducer::reduce_groups`] is one parallel pass:
//!
//! 1. check that the element type and group size fit the device,
//! 2. fetch (or compile) the kernel pipeline,
//! 3. upload the pass input and kernel parameters,
//! 4. dispatch one workgroup per group,
//! 5. copy the per-group outputs into a staging buffer and wait for the device,
//! 6. map the staging buffer and read the outputs back to the host.
//!
//! The host does not continue until the readback completes, so consecutive
//! passes never overlap.
//!
//! ## Concurrency
//!
//! Device, queue and pipeline cache live in a [`Runtime`] behind a `Mutex`
//! owned by the reducer. Concurrent statistics on one reducer serialize at pass
//! granularity; separate reducers never contend.

use std::sync::{mpsc, Mutex, MutexGuard};

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::kernel::{group_count, GroupOp, GroupReducer};
use crate::engine::types::{Element, GroupSize};

use crate::gpu::context::{AdapterSummary, GPUContext};
use crate::gpu::pipeline::PipelineCache;

/// Uniform parameters shared by every reduction kernel.
///
/// `mean` carries the bit pattern of the element-typed mean; it is only read by
/// the `std_dev` kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct KernelParams {
    pub group_size: u32,
    pub group_count: u32,
    pub mean: u32,
    pub _pad: u32,
}

struct Runtime {
    context: GPUContext,
    pipelines: PipelineCache,
}

impl Runtime {
    fn dispatch_pass<T: Element>(
        &mut self,
        op: GroupOp<T>,
        wgsl_type: &'static str,
        input: &[T],
        group_size: GroupSize,
        groups: usize,
    ) -> ReduceResult<Vec<T>> {
        let Runtime { context, pipelines } = self;
        let kernel = op.kernel_name();
        let g = group_size.get();

        let limit = context.max_group_size();
        if g > limit {
            return Err(ReduceError::GroupTooLarge { group_size: g, limit });
        }

        let input_bytes: &[u8] = bytemuck::cast_slice(input);
        let binding_limit = u64::from(context.limits.max_storage_buffer_binding_size)
            .min(context.limits.max_buffer_size);
        if input_bytes.len() as u64 > binding_limit {
            return Err(ReduceError::dispatch(
                kernel,
                format!(
                    "pass input of {} bytes exceeds the device binding limit of {binding_limit} bytes",
                    input_bytes.len()
                ),
            ));
        }

        let mean: u32 = bytemuck::try_cast(op.mean_param())
            .map_err(|e| ReduceError::dispatch(kernel, format!("mean parameter: {e}")))?;
        let params = KernelParams {
            group_size: to_u32(g, kernel)?,
            group_count: to_u32(groups, kernel)?,
            mean,
            _pad: 0,
        };

        let (pipeline, layout) = pipelines.get_or_create(context, &op, wgsl_type, g)?;
        let device = &context.device;

        let input_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("group_reduce_input"),
            contents: input_bytes,
            usage: wgpu::BufferUsages::STORAGE,
        });

        let output_size = (groups * std::mem::size_of::<T>()) as wgpu::BufferAddress;
        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("group_reduce_output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("group_reduce_staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let parameter_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("group_reduce_params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("group_reduce_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: parameter_buffer.as_entire_binding(),
                },
            ],
        });

        let (x, y) = workgroup_grid(groups, context.limits.max_compute_workgroups_per_dimension);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("group_reduce_encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, 1);
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        let submission = context.queue.submit(Some(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map_err(|e| ReduceError::dispatch(kernel, format!("wgpu device poll failed: {e:?}")))?;

        receiver
            .recv()
            .map_err(|_| ReduceError::Readback {
                message: "map_async callback was not invoked".into(),
            })?
            .map_err(|e| ReduceError::Readback {
                message: format!("map_async failed: {e}"),
            })?;

        let mut outputs = vec![T::ZERO; groups];
        {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice_mut::<T, u8>(&mut outputs).copy_from_slice(&data);
        }
        staging_buffer.unmap();

        Ok(outputs)
    }
}

fn to_u32(value: usize, kernel: &'static str) -> ReduceResult<u32> {
    u32::try_from(value)
        .map_err(|_| ReduceError::dispatch(kernel, format!("{value} does not fit a u32 kernel parameter")))
}

/// Splits `groups` workgroups into a 2-D grid whose x extent respects the
/// per-dimension dispatch limit.
fn workgroup_grid(groups: usize, max_per_dimension: u32) -> (u32, u32) {
    let max = max_per_dimension.max(1) as usize;
    let x = groups.min(max);
    let y = groups.div_ceil(x.max(1));
    (x as u32, y as u32)
}

/// [`GroupReducer`] that runs every pass as a `wgpu` compute dispatch.
///
/// Supports `f32` and `i32` elements. Other element types fail with
/// [`ReduceError::UnsupportedElement`]; group sizes above the device's
/// workgroup limit fail with [`ReduceError::GroupTooLarge`].
pub struct GpuReducer {
    runtime: Mutex<Runtime>,
    adapter: AdapterSummary,
    max_group_size: usize,
}

impl std::fmt::Debug for GpuReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuReducer")
            .field("adapter", &self.adapter)
            .field("max_group_size", &self.max_group_size)
            .finish_non_exhaustive()
    }
}

impl GpuReducer {
    /// Opens a device on the adapter at `adapter_index`.
    ///
    /// Out-of-range indices fall back to the default high-performance adapter.
    ///
    /// ## Errors
    /// [`ReduceError::Device`] if no device can be opened.
    pub fn new(adapter_index: usize) -> ReduceResult<Self> {
        let context = GPUContext::new(adapter_index)?;
        let adapter = context.adapter.clone();
        let max_group_size = context.max_group_size();
        Ok(Self {
            runtime: Mutex::new(Runtime {
                context,
                pipelines: PipelineCache::new(),
            }),
            adapter,
            max_group_size,
        })
    }

    /// Adapter this reducer dispatches to.
    pub fn adapter(&self) -> &AdapterSummary {
        &self.adapter
    }

    /// Largest group size the device accepts.
    pub fn max_group_size(&self) -> usize {
        self.max_group_size
    }

    fn runtime(&self) -> ReduceResult<MutexGuard<'_, Runtime>> {
        self.runtime
            .lock()
            .map_err(|_| ReduceError::LockPoisoned { what: "gpu runtime" })
    }
}

impl<T: Element> GroupReducer<T> for GpuReducer {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn reduce_groups(
        &self,
        op: GroupOp<T>,
        input: &[T],
        group_size: GroupSize,
    ) -> ReduceResult<Vec<T>> {
        let wgsl_type = T::WGSL_TYPE.ok_or(ReduceError::UnsupportedElement {
            element: T::NAME,
            backend: "gpu",
        })?;

        let groups = group_count(input.len(), group_size)?;
        if groups == 0 {
            return Ok(Vec::new());
        }

        let mut run_time = self.runtime()?;
        run_time.dispatch_pass(op, wgsl_type, input, group_size, groups)
    }
}
