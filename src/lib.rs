//! jtl: judge protocol runtime
//! In-process contracts for the checker, test generator and valuer programs
//! launched by a judging harness
//!
//! # Architecture
//!
//! Every program is started by an external executor that hands down file
//! descriptors and environment variables. This crate resolves them and
//! speaks the wire formats the harness expects.
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Closed outcome and status enums, error type
//! - [`config::env`]: Environment and descriptor resolution
//!
//! ## Randomness ([`random`])
//! - [`random::generator`]: Seeded generator with unbiased range sampling
//! - [`random::global`]: Process-wide generator installed by testgen
//!
//! ## Checker ([`checker`])
//! - [`checker::runtime`]: Stream reads with fault attribution, single verdict
//! - [`checker::token`]: Whitespace tokenizer
//! - [`checker::compare`]: Epsilon and case-insensitive comparison
//! - [`checker::outcome`]: Verdict file writer and parser
//! - [`checker::cmp_tokens`]: Built-in token comparison checker
//!
//! ## Test Generator ([`testgen`])
//! - [`testgen::session`]: Test id, output destination and generator
//!
//! ## Valuer ([`valuer`])
//! - [`valuer::proto`]: Judge log model and control protocol codec
//! - [`valuer::session`]: Session state and protocol driver
//! - [`valuer::icpc`]: Stop on first failure
//! - [`valuer::partial`]: Share of accepted tests
//!
//! ## Utilities ([`utils`])
//! - [`utils::fd`]: Inherited descriptor validation
//! - [`utils::fatal`]: Fail-fast exit for integration faults
//!
//! # Design Principles
//!
//! 1. **Fail fast on launch faults** - Bad environment or descriptors exit with a diagnostic
//! 2. **Verdicts are values** - Judging outcomes travel through wire formats, never panics
//! 3. **Types prevent misuse** - A finished checker cannot be touched again
//! 4. **Protocol owned by the driver** - Scoring policies only see callbacks

// Configuration & Errors
pub mod config;

// Utilities
pub mod utils;

// Deterministic Randomness
pub mod random;

// Checker Runtime
pub mod checker;

// Test Generator Runtime
pub mod testgen;

// Valuer Runtime
pub mod valuer;

// CLI entrypoint wiring shared by the built-in binaries.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use random::{Generator, RandomSource, Seed, SeedWidth};
