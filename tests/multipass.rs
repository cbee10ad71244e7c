mod common;

use group_reduce::{
    max, mean, min, pad_to_group, padded_len, reduce_with, summarize, variance, CpuReducer,
    GroupOp, PassState,
};

use common::*;

#[test]
fn cube_of_group_size_takes_two_passes() {
    let cpu = CpuReducer::new();
    let group = 8;
    let data = noise(group * group * group, 7);

    let lo = min(&cpu, &data, g(group)).unwrap();
    let hi = max(&cpu, &data, g(group)).unwrap();
    assert_eq!(lo.passes, 2);
    assert_eq!(hi.passes, 2);
    assert_eq!(lo.value, data.iter().copied().fold(f64::INFINITY, f64::min));
    assert_eq!(hi.value, data.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    let avg = mean(&cpu, &data, g(group)).unwrap();
    assert_eq!(avg.passes, 2);
    assert_close(avg.value, serial_mean(&data), 1e-9);

    let var = variance(&cpu, &data, g(group)).unwrap();
    assert_eq!(var.passes, 4);
    assert_close(var.value, serial_variance(&data), 1e-9);
}

#[test]
fn one_past_the_cube_takes_three_passes() {
    let cpu = CpuReducer::new();
    let group = 6;
    let data = noise(group * group * group + 1, 11);

    let sum = reduce_with(&cpu, &data, g(group), GroupOp::Sum).unwrap();
    assert_eq!(sum.passes, 3);
    assert_close(sum.value, data.iter().sum(), 1e-9);

    let stats = summarize(&cpu, &data, g(group)).unwrap();
    assert_close(stats.mean, serial_mean(&data), 1e-9);
    assert_close(stats.variance.unwrap(), serial_variance(&data), 1e-9);
}

#[test]
fn pass_states_shrink_by_the_group_size() {
    let cpu = CpuReducer::new();
    let data = noise(1000, 3);

    let state = PassState::new(&data, g(10), GroupOp::Sum).unwrap();
    assert_eq!(state.len(), 1000);
    assert_eq!(state.groups(), 100);

    let state = state.advance(&cpu).unwrap();
    assert_eq!(state.len(), 100);
    assert_eq!(state.passes(), 1);
    assert!(!state.is_terminal());

    let state = state.advance(&cpu).unwrap();
    assert_eq!(state.len(), 10);
    assert!(state.is_terminal());

    let (op, residual) = state.into_residual();
    assert_eq!(op, GroupOp::Sum);
    assert_eq!(residual.len(), 10);
}

#[test]
fn variance_chain_switches_to_sum_after_first_pass() {
    let cpu = CpuReducer::new();
    let data = noise(64, 5);
    let m = serial_mean(&data);

    let state = PassState::new(&data, g(4), GroupOp::SquaredDeviation { mean: m }).unwrap();
    let state = state.advance(&cpu).unwrap();
    assert_eq!(state.op(), GroupOp::Sum);
}

#[test]
fn intermediate_results_are_repadded() {
    let cpu = CpuReducer::new();
    // 7 groups of 3 after the first pass, padded back to 9.
    let data: Vec<i64> = (1..=20).collect();

    let state = PassState::new(&data, g(3), GroupOp::Max).unwrap();
    assert_eq!(state.buffer().len(), 21);

    let state = state.advance(&cpu).unwrap();
    assert_eq!(state.len(), 7);
    assert_eq!(state.buffer().len(), 9);
    assert_eq!(state.buffer()[7..], [20, 20]);
}

#[test]
fn padding_never_changes_a_statistic() {
    let cpu = CpuReducer::new();
    let data = noise(37, 13);
    let group = g(8);

    for op in [GroupOp::Min, GroupOp::Max, GroupOp::Sum] {
        let padded = pad_to_group(&data, group, &op);
        assert_eq!(padded.len(), padded_len(data.len(), group));
        assert_eq!(
            reduce_with(&cpu, &padded, group, op).unwrap().value.to_bits(),
            reduce_with(&cpu, &data, group, op).unwrap().value.to_bits(),
            "{op:?}"
        );
    }

    let m = serial_mean(&data);
    let sq = GroupOp::SquaredDeviation { mean: m };
    let padded = pad_to_group(&data, group, &sq);
    let direct = reduce_with(&cpu, &data, group, sq).unwrap().value;
    let via_padding = reduce_with(&cpu, &padded, group, sq).unwrap().value;
    assert_close(via_padding, direct, 1e-12);
}

#[test]
fn two_element_groups_reach_one_value() {
    let cpu = CpuReducer::new();
    let data: Vec<i32> = (0..1025).collect();

    let r = reduce_with(&cpu, &data, g(2), GroupOp::Sum).unwrap();
    assert_eq!(r.value, (0..1025).sum::<i32>());
    assert_eq!(r.passes, 10);
}
