mod common;

use proptest::prelude::*;

use group_reduce::{summarize, CpuReducer, GroupSize, ReduceError};

use common::{assert_close, serial_mean, serial_variance};

fn values_and_group() -> impl Strategy<Value = (Vec<f64>, usize)> {
    (prop::collection::vec(-1.0e6f64..1.0e6, 2..600), 2usize..40)
}

proptest! {
    #[test]
    fn min_and_max_are_exact((data, group) in values_and_group()) {
        let cpu = CpuReducer::new();
        let stats = summarize(&cpu, &data, GroupSize::new(group).unwrap()).unwrap();

        let lo = data.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(stats.min, lo);
        prop_assert_eq!(stats.max, hi);
    }

    #[test]
    fn moments_match_serial_reference((data, group) in values_and_group()) {
        let cpu = CpuReducer::new();
        let stats = summarize(&cpu, &data, GroupSize::new(group).unwrap()).unwrap();

        assert_close(stats.mean, serial_mean(&data), 1e-6);
        let var = stats.variance.unwrap();
        assert_close(var, serial_variance(&data), 1e-6);
        prop_assert_eq!(stats.std_dev, Some(var.sqrt()));
        prop_assert_eq!(stats.count, data.len());
    }

    #[test]
    fn integer_min_max_are_exact(
        data in prop::collection::vec(any::<i32>(), 2..400),
        group in 2usize..20,
    ) {
        let cpu = CpuReducer::new();
        let stats = summarize(&cpu, &data, GroupSize::new(group).unwrap()).unwrap();
        prop_assert_eq!(stats.min, *data.iter().min().unwrap());
        prop_assert_eq!(stats.max, *data.iter().max().unwrap());
    }

    #[test]
    fn integer_mean_truncates_the_exact_sum(
        data in prop::collection::vec(-10_000i64..10_000, 1..400),
        group in 2usize..20,
    ) {
        let cpu = CpuReducer::new();
        let m = group_reduce::mean(&cpu, &data, GroupSize::new(group).unwrap()).unwrap();
        let exact: i64 = data.iter().sum();
        prop_assert_eq!(m.value, exact / data.len() as i64);
    }

    #[test]
    fn degenerate_group_sizes_are_rejected(group in 0usize..2) {
        prop_assert_eq!(
            GroupSize::new(group),
            Err(ReduceError::InvalidGroupSize { group_size: group })
        );
    }
}
