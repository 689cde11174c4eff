//! # emerald-evm-tests
//!
//! JSON fixture runner for the emerald EVM interpreter.
//!
//! This crate provides:
//! - JSON parsing for the ethereum/tests `VMTests` format
//! - A runner executing each case against an in-memory environment
//! - Test result aggregation and reporting
//!
//! ## Test Format
//!
//! A fixture file maps test names to cases. Each case carries the block
//! environment, the execution parameters, the pre-state and, when execution
//! is expected to succeed, the remaining gas, output and post-state.
//! Cases without `gas` and `post` expect the frame to fail.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod runner;
mod types;

pub use error::{TestError, TestResult};
pub use runner::{TestRunner, TestStats};
pub use types::*;
pub use vm_test::{VmTestResults, VmTestRunner};
