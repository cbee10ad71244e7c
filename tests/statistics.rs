mod common;

use group_reduce::{
    max, mean, min, std_dev, summarize, variance, CpuReducer, ReduceError, Reducer,
};

use common::*;

#[test]
fn mixed_sign_scenario_f64() {
    let cpu = CpuReducer::new();
    let data = as_f64(&SCENARIO_ONE);

    let stats = summarize(&cpu, &data, g(5)).unwrap();
    assert_eq!(stats.count, 10);
    assert_eq!(stats.min, -7.0);
    assert_eq!(stats.max, 21.0);
    assert_close(stats.mean, 4.0, 1e-12);
    let var = stats.variance.unwrap();
    assert_close(var, 644.0 / 9.0, 1e-12);
    assert_close(var, serial_variance(&data), 1e-12);
    assert_eq!(stats.std_dev, Some(var.sqrt()));
}

#[test]
fn mixed_sign_scenario_integers() {
    let cpu = CpuReducer::new();

    let stats = summarize(&cpu, &SCENARIO_ONE, g(5)).unwrap();
    assert_eq!(stats.min, -7);
    assert_eq!(stats.max, 21);
    assert_eq!(stats.mean, 4);
    assert_eq!(stats.variance, Some(71));
    assert_eq!(stats.std_dev, Some(8));
}

#[test]
fn mostly_ones_scenario() {
    let cpu = CpuReducer::new();
    let data = as_f64(&SCENARIO_TWO);

    let stats = summarize(&cpu, &data, g(5)).unwrap();
    assert_eq!(stats.min, -3.0);
    assert_eq!(stats.max, 3.0);
    assert_close(stats.mean, 0.6, 1e-12);
    assert_close(stats.variance.unwrap(), 2.4889, 1e-4);
    assert_close(stats.std_dev.unwrap(), 1.5776, 1e-4);
}

#[test]
fn mostly_ones_scenario_f32() {
    let cpu = CpuReducer::new();
    let data = as_f32(&SCENARIO_TWO);

    let stats = summarize(&cpu, &data, g(5)).unwrap();
    assert_eq!(stats.min, -3.0);
    assert_eq!(stats.max, 3.0);
    assert_close(stats.mean as f64, 0.6, 1e-6);
    assert_close(stats.variance.unwrap() as f64, 22.4 / 9.0, 1e-5);
}

#[test]
fn individual_statistics_agree_with_summary() {
    let cpu = CpuReducer::new();
    let data = as_f64(&SCENARIO_ONE);
    let stats = summarize(&cpu, &data, g(5)).unwrap();

    assert_eq!(min(&cpu, &data, g(5)).unwrap().value, stats.min);
    assert_eq!(max(&cpu, &data, g(5)).unwrap().value, stats.max);
    assert_eq!(mean(&cpu, &data, g(5)).unwrap().value, stats.mean);
    assert_eq!(Some(variance(&cpu, &data, g(5)).unwrap().value), stats.variance);
    assert_eq!(Some(std_dev(&cpu, &data, g(5)).unwrap().value), stats.std_dev);
}

#[test]
fn sequence_of_exactly_one_group_needs_no_pass() {
    let cpu = CpuReducer::new();
    let data = [4.0f64, -2.0, 9.5, 0.5, 3.0];

    let lo = min(&cpu, &data, g(5)).unwrap();
    assert_eq!(lo.value, -2.0);
    assert_eq!(lo.passes, 0);

    let avg = mean(&cpu, &data, g(5)).unwrap();
    assert_eq!(avg.passes, 0);
    assert_close(avg.value, 3.0, 1e-12);

    let var = variance(&cpu, &data, g(5)).unwrap();
    assert_eq!(var.passes, 0);
    assert_close(var.value, serial_variance(&data), 1e-12);
}

#[test]
fn single_element() {
    let cpu = CpuReducer::new();

    assert_eq!(min(&cpu, &[42i64], g(4)).unwrap().value, 42);
    assert_eq!(max(&cpu, &[42i64], g(4)).unwrap().value, 42);
    assert_eq!(mean(&cpu, &[42i64], g(4)).unwrap().value, 42);
    assert_eq!(
        variance(&cpu, &[42i64], g(4)),
        Err(ReduceError::UndefinedVariance { count: 1 })
    );
    assert_eq!(
        std_dev(&cpu, &[42i64], g(4)),
        Err(ReduceError::UndefinedVariance { count: 1 })
    );
}

#[test]
fn single_element_summary_reports_undefined_variance() {
    let cpu = CpuReducer::new();

    let stats = summarize(&cpu, &[42i32], g(4)).unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.min, 42);
    assert_eq!(stats.max, 42);
    assert_eq!(stats.mean, 42);
    assert_eq!(stats.variance, None);
    assert_eq!(stats.std_dev, None);

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["mean"], 42);
    assert!(json["variance"].is_null());
    assert!(json["std_dev"].is_null());
}

#[test]
fn empty_input_fails_every_statistic() {
    let cpu = CpuReducer::new();
    let empty: [f32; 0] = [];

    assert_eq!(min(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
    assert_eq!(max(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
    assert_eq!(mean(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
    assert_eq!(variance(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
    assert_eq!(std_dev(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
    assert_eq!(summarize(&cpu, &empty, g(8)), Err(ReduceError::EmptyInput));
}

#[test]
fn caller_input_is_not_modified() {
    let cpu = CpuReducer::new();
    let data = as_f64(&SCENARIO_ONE)[..7].to_vec();
    let before = data.clone();

    summarize(&cpu, &data, g(3)).unwrap();
    assert_eq!(data, before);
}

#[test]
fn facade_over_dedicated_pool() {
    let reducer = Reducer::new(CpuReducer::with_threads(2).unwrap(), g(5));
    let data = as_f64(&SCENARIO_TWO);

    assert_eq!(reducer.min(&data).unwrap(), -3.0);
    assert_eq!(reducer.max(&data).unwrap(), 3.0);
    assert_close(reducer.std_dev(&data).unwrap(), 1.5776, 1e-4);
}
