//! Checker runtime
//!
//! Reads the test, correct answer and contestant answer streams handed
//! down by the executor and reports a single verdict.

pub mod cmp_tokens;
pub mod compare;
pub mod outcome;
pub mod runtime;
pub mod token;

pub use cmp_tokens::{check_tokens, CompareOptions};
pub use runtime::{CheckResult, Checker, CheckerEnv, CheckerReport, Rejected, Stream};
