//! Test generator runtime
//!
//! Resolves the test id, output destination and seed for one generated
//! test and installs the process-wide generator.

pub mod session;

pub use session::{init, init_with, TestOutput, TestgenEnv, TestgenOptions, TestgenSession};
