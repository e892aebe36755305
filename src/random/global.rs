/// Process-wide generator
///
/// Generator code deep inside a test generator can reach the session's
/// generator without threading it through every call. The slot is filled
/// exactly once by testgen initialization; a second install or an access
/// before the install is a harness logic bug.
use crate::config::types::{JtlError, Result};
use crate::random::generator::{Generator, RandomSource};
use crate::utils::fatal::OrFatal;
use std::sync::{Mutex, OnceLock};

static GLOBAL_GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

/// Install the process-wide generator. Fails if one is already installed.
pub fn install(generator: Generator) -> Result<()> {
    GLOBAL_GENERATOR
        .set(Mutex::new(generator))
        .map_err(|_| JtlError::Contract("global generator is constructed twice".to_string()))?;
    log::debug!("global generator installed");
    Ok(())
}

pub fn is_installed() -> bool {
    GLOBAL_GENERATOR.get().is_some()
}

/// Run `f` against the process-wide generator
pub fn try_with_global<R>(f: impl FnOnce(&mut Generator) -> R) -> Result<R> {
    let slot = GLOBAL_GENERATOR.get().ok_or_else(|| {
        JtlError::Contract(
            "generator is requested, but it is not initialized yet. Was testgen::init() called?"
                .to_string(),
        )
    })?;
    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(f(&mut guard))
}

/// Like [`try_with_global`], exiting the process if nothing is installed
pub fn with_global<R>(f: impl FnOnce(&mut Generator) -> R) -> R {
    try_with_global(f).or_fatal()
}

/// Handle that forwards to the process-wide generator.
///
/// Lets code generic over [`RandomSource`] use the global generator in
/// production while tests pass their own seeded [`Generator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalGenerator;

impl RandomSource for GlobalGenerator {
    fn next_u64(&mut self) -> u64 {
        with_global(|g| g.next_u64())
    }
}
