//! Runtime backend selection.
//!
//! [`AnyReducer`] lets callers pick a backend from configuration without
//! making every caller generic over the reducer type.

use crate::config::{Backend, ReduceConfig};
use crate::engine::cpu::CpuReducer;
use crate::engine::error::ReduceResult;
use crate::engine::kernel::{GroupOp, GroupReducer};
use crate::engine::types::{Element, GroupSize};

#[cfg(feature = "gpu")]
use crate::gpu::GpuReducer;

/// A [`GroupReducer`] chosen at runtime.
#[derive(Debug)]
pub enum AnyReducer {
    Cpu(CpuReducer),
    #[cfg(feature = "gpu")]
    Gpu(GpuReducer),
}

impl AnyReducer {
    /// Builds the backend named by `config`.
    ///
    /// ## Errors
    /// * [`ReduceError::Config`] when the GPU backend is requested from a
    ///   build without the `gpu` feature, or `threads` is zero.
    /// * [`ReduceError::Device`] when no GPU device can be opened.
    pub fn from_config(config: &ReduceConfig) -> ReduceResult<Self> {
        match config.backend {
            Backend::Cpu => {
                let cpu = match config.threads {
                    Some(threads) => CpuReducer::with_threads(threads)?,
                    None => CpuReducer::new(),
                };
                Ok(AnyReducer::Cpu(cpu))
            }
            #[cfg(feature = "gpu")]
            Backend::Gpu => Ok(AnyReducer::Gpu(GpuReducer::new(config.adapter)?)),
            #[cfg(not(feature = "gpu"))]
            Backend::Gpu => Err(crate::engine::error::ReduceError::Config {
                message: "the gpu backend requires building with `--features gpu`".into(),
            }),
        }
    }

    /// Which backend this is.
    pub fn kind(&self) -> Backend {
        match self {
            AnyReducer::Cpu(_) => Backend::Cpu,
            #[cfg(feature = "gpu")]
            AnyReducer::Gpu(_) => Backend::Gpu,
        }
    }
}

impl From<CpuReducer> for AnyReducer {
    fn from(cpu: CpuReducer) -> Self {
        AnyReducer::Cpu(cpu)
    }
}

#[cfg(feature = "gpu")]
impl From<GpuReducer> for AnyReducer {
    fn from(gpu: GpuReducer) -> Self {
        AnyReducer::Gpu(gpu)
    }
}

impl<T: Element> GroupReducer<T> for AnyReducer {
    fn name(&self) -> &'static str {
        match self {
            AnyReducer::Cpu(cpu) => GroupReducer::<T>::name(cpu),
            #[cfg(feature = "gpu")]
            AnyReducer::Gpu(gpu) => GroupReducer::<T>::name(gpu),
        }
    }

    fn reduce_groups(
        &self,
        op: GroupOp<T>,
        input: &[T],
        group_size: GroupSize,
    ) -> ReduceResult<Vec<T>> {
        match self {
            AnyReducer::Cpu(cpu) => cpu.reduce_groups(op, input, group_size),
            #[cfg(feature = "gpu")]
            AnyReducer::Gpu(gpu) => gpu.reduce_groups(op, input, group_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_backend_from_default_config() {
        let reducer = AnyReducer::from_config(&ReduceConfig::default()).unwrap();
        assert_eq!(reducer.kind(), Backend::Cpu);
        assert_eq!(GroupReducer::<f32>::name(&reducer), "cpu");
    }

    #[test]
    fn threads_build_a_dedicated_pool() {
        let config = ReduceConfig {
            threads: Some(3),
            ..ReduceConfig::default()
        };
        match AnyReducer::from_config(&config).unwrap() {
            AnyReducer::Cpu(cpu) => assert_eq!(cpu.threads(), 3),
            #[cfg(feature = "gpu")]
            other => panic!("expected cpu backend, got {other:?}"),
        }
    }

    #[test]
    fn forwards_passes_to_the_inner_backend() {
        let reducer = AnyReducer::from(CpuReducer::new());
        let g = GroupSize::new(2).unwrap();
        assert_eq!(reducer.reduce_groups(GroupOp::Sum, &[1, 2, 3, 4], g), Ok(vec![3, 7]));
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn gpu_without_feature_is_a_config_error() {
        use crate::engine::error::ReduceError;

        let config = ReduceConfig {
            backend: Backend::Gpu,
            ..ReduceConfig::default()
        };
        assert!(matches!(
            AnyReducer::from_config(&config),
            Err(ReduceError::Config { .. })
        ));
    }
}
