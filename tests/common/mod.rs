//! Serial reference implementations shared by the integration tests.

#![allow(dead_code)]

use group_reduce::GroupSize;

pub const SCENARIO_ONE: [i32; 10] = [3, 2, 5, -1, 13, -7, 21, -5, 0, 9];
pub const SCENARIO_TWO: [i32; 10] = [1, 1, 1, 3, -3, -1, 1, 1, 1, 1];

pub fn g(n: usize) -> GroupSize {
    GroupSize::new(n).unwrap()
}

pub fn as_f64(values: &[i32]) -> Vec<f64> {
    values.iter().map(|&x| x as f64).collect()
}

pub fn as_f32(values: &[i32]) -> Vec<f32> {
    values.iter().map(|&x| x as f32).collect()
}

pub fn serial_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn serial_variance(values: &[f64]) -> f64 {
    let mean = serial_mean(values);
    values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (values.len() - 1) as f64
}

/// Deterministic pseudo-random sequence in `[-100, 100)`.
pub fn noise(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 200.0 - 100.0
        })
        .collect()
}

pub fn assert_close(actual: f64, expected: f64, rel: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= rel * scale,
        "expected {expected}, got {actual} (rel tolerance {rel})"
    );
}
