//! Configuration
//!
//! Launch configuration resolved from the environment, plus the shared
//! closed enums and error type.

pub mod env;
pub mod types;
