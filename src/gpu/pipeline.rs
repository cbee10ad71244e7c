//! # GPU Compute Pipeline Cache
//!
//! Creates, stores and reuses the `wgpu::ComputePipeline` for each reduction
//! kernel together with its `BindGroupLayout`.
//!
//! ## Purpose
//!
//! * each `(kernel, element type, group size)` is compiled **at most once** per
//!   device,
//! * later passes of the same run, and later runs on the same reducer, reuse
//!   the compiled pipeline.
//!
//! ## Binding model
//!
//! Every reduction pipeline uses the same three-entry layout:
//!
//! * Binding `0` - read-only storage buffer holding the pass input
//! * Binding `1` - read-write storage buffer receiving one value per group
//! * Binding `2` - uniform buffer of kernel parameters
//!
//! ## Thread safety
//!
//! The cache is not synchronized itself; it is owned by the GPU runtime, which
//! sits behind a `Mutex`.

use std::collections::HashMap;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::kernel::GroupOp;
use crate::engine::types::Element;

use crate::gpu::context::GPUContext;
use crate::gpu::shaders::generate_kernel;

/// Key identifying one specialised kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    kernel: &'static str,
    wgsl_type: &'static str,
    group_size: usize,
}

/// Cache of reduction pipelines and their bind group layouts.
#[derive(Debug, Default)]
pub struct PipelineCache {
    map: HashMap<PipelineKey, (wgpu::ComputePipeline, wgpu::BindGroupLayout)>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves the pipeline for `op` over `wgsl_type` with groups of
    /// `group_size`, compiling it on first use.
    pub fn get_or_create<T: Element>(
        &mut self,
        context: &GPUContext,
        op: &GroupOp<T>,
        wgsl_type: &'static str,
        group_size: usize,
    ) -> ReduceResult<(&wgpu::ComputePipeline, &wgpu::BindGroupLayout)> {
        let key = PipelineKey {
            kernel: op.kernel_name(),
            wgsl_type,
            group_size,
        };

        if !self.map.contains_key(&key) {
            tracing::debug!(
                kernel = key.kernel,
                element = wgsl_type,
                group_size,
                "compiling reduction pipeline"
            );
            let source = generate_kernel(op, wgsl_type, group_size);
            let entry = create_pipeline(context, &source, key.kernel);
            self.map.insert(key, entry);
        }

        let (pipeline, layout) = self
            .map
            .get(&key)
            .ok_or_else(|| ReduceError::dispatch(key.kernel, "pipeline cache miss after insert"))?;
        Ok((pipeline, layout))
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_pipeline(
    context: &GPUContext,
    source: &str,
    entry_point: &'static str,
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let entries = [
        storage_entry(0, true),
        storage_entry(1, false),
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ];

    let layout = context
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("group_reduce_bgl"),
            entries: &entries,
        });

    let pipeline_layout = context
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("group_reduce_pipeline_layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

    let module = context
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(entry_point),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

    let pipeline = context
        .device
        .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(entry_point),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(entry_point),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

    (pipeline, layout)
}
