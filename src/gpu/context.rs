//! # GPU Device Context
//!
//! Adapter discovery and device creation for the GPU backend.
//!
//! A [`GPUContext`] owns one `wgpu::Device` and its queue. It is created once
//! per [`GpuReducer`](super::GpuReducer) and lives for the reducer's lifetime,
//! so device selection happens once per run rather than once per pass.
//!
//! ## Adapter selection
//!
//! Adapters are indexed in the order `wgpu::Instance::enumerate_adapters`
//! reports them, which is also the order [`list_adapters`] prints. An index
//! past the end falls back to the default high-performance adapter with a
//! warning.

use serde::Serialize;

use crate::engine::error::{ReduceError, ReduceResult};

/// Printable description of one adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdapterSummary {
    pub index: usize,
    pub name: String,
    pub backend: String,
    pub device_type: String,
}

impl AdapterSummary {
    fn from_info(index: usize, info: &wgpu::AdapterInfo) -> Self {
        Self {
            index,
            name: info.name.clone(),
            backend: format!("{:?}", info.backend),
            device_type: format!("{:?}", info.device_type),
        }
    }
}

impl std::fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({}, {})", self.index, self.name, self.backend, self.device_type)
    }
}

/// Lists every adapter visible to `wgpu`, in selection-index order.
pub fn list_adapters() -> Vec<AdapterSummary> {
    let instance = wgpu::Instance::default();
    pollster::block_on(instance.enumerate_adapters(wgpu::Backends::all()))
        .iter()
        .enumerate()
        .map(|(i, adapter)| AdapterSummary::from_info(i, &adapter.get_info()))
        .collect()
}

/// GPU device, queue and the limits kernels are checked against.
pub struct GPUContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub limits: wgpu::Limits,
    pub adapter: AdapterSummary,
}

impl std::fmt::Debug for GPUContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GPUContext")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl GPUContext {
    /// Opens a device on the adapter at `adapter_index`.
    ///
    /// ## Errors
    /// [`ReduceError::Device`] if no adapter is available or the device
    /// request fails.
    pub fn new(adapter_index: usize) -> ReduceResult<Self> {
        let instance = wgpu::Instance::default();

        let mut adapters = pollster::block_on(instance.enumerate_adapters(wgpu::Backends::all()));
        let (index, adapter) = if adapter_index < adapters.len() {
            (adapter_index, adapters.swap_remove(adapter_index))
        } else {
            tracing::warn!(
                requested = adapter_index,
                available = adapters.len(),
                "adapter index out of range, falling back to the default adapter"
            );
            let adapter = pollster::block_on(instance.request_adapter(
                &wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                },
            ))
            .map_err(|e| ReduceError::Device {
                message: format!("no suitable adapter: {e}"),
            })?;
            (adapter_index.min(adapters.len()), adapter)
        };

        let summary = AdapterSummary::from_info(index, &adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("group_reduce_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| ReduceError::Device {
            message: format!("device request failed: {e}"),
        })?;

        let limits = device.limits();
        tracing::info!(
            adapter = %summary,
            max_invocations = limits.max_compute_invocations_per_workgroup,
            "gpu device ready"
        );

        Ok(Self { device, queue, limits, adapter: summary })
    }

    /// Largest group size a single workgroup can reduce on this device.
    pub fn max_group_size(&self) -> usize {
        self.limits
            .max_compute_invocations_per_workgroup
            .min(self.limits.max_compute_workgroup_size_x) as usize
    }
}
