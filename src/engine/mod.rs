//! # Engine Module
//!
//! Backend-independent reduction engine.
//!
//! This module contains the building blocks every statistic is made of:
//! - Element model and result types
//! - Padding normalizer
//! - Group kernels and the backend seam
//! - Multi-pass driver and serial finisher
//! - CPU backend
//! - Statistics orchestration
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod padding;
pub mod kernel;
pub mod pass;
pub mod finish;
pub mod cpu;
pub mod stats;
