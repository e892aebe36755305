//! Deterministic pseudo-random generation
//!
//! Generators are seeded from the opaque seed handed down by the harness and
//! must replay identical sequences for identical call sequences.

pub mod generator;
pub mod global;

pub use generator::{Generator, RandomSource, Seed, SeedWidth};
