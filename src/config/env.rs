/// Environment/descriptor resolver
///
/// Every runtime learns its launch configuration from environment variables
/// set by the executor: descriptor numbers, integers and hex-encoded seeds.
/// The `EnvResolver` methods return `Result` so they can be exercised
/// against a fixed map; the free `resolve_*` functions read the process
/// environment and exit on the first malformed value.
use crate::config::types::{JtlError, Result};
use crate::utils::fatal::OrFatal;
use crate::utils::fd::{open_fd, FdMode};
use std::fs::File;

/// Checker: correct answer stream
pub const JJS_CORR: &str = "JJS_CORR";
/// Checker: contestant answer stream
pub const JJS_SOL: &str = "JJS_SOL";
/// Checker: test input stream. Testgen: generated test output stream
pub const JJS_TEST: &str = "JJS_TEST";
/// Checker: verdict channel
pub const JJS_CHECKER_OUT: &str = "JJS_CHECKER_OUT";
/// Checker: diagnostic comment channel
pub const JJS_CHECKER_COMMENT: &str = "JJS_CHECKER_COMMENT";
/// Testgen: test id
pub const JJS_TEST_ID: &str = "JJS_TEST_ID";
/// Testgen: hex-encoded generator seed
pub const JJS_RANDOM_SEED: &str = "JJS_RANDOM_SEED";
/// Valuer: public comment channel
pub const JJS_VALUER_COMMENT_PUB: &str = "JJS_VALUER_COMMENT_PUB";
/// Valuer: private comment channel
pub const JJS_VALUER_COMMENT_PRIV: &str = "JJS_VALUER_COMMENT_PRIV";

/// Resolves configuration values through a variable lookup function
pub struct EnvResolver<F> {
    lookup: F,
}

/// Resolver over the real process environment
pub type ProcessEnv = EnvResolver<fn(&str) -> Option<String>>;

fn process_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl ProcessEnv {
    pub fn process() -> Self {
        EnvResolver {
            lookup: process_lookup,
        }
    }
}

impl<F> EnvResolver<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        EnvResolver { lookup }
    }

    /// Value of a variable that must be present
    pub fn required(&self, name: &str) -> Result<String> {
        (self.lookup)(name).ok_or_else(|| JtlError::Env(format!("var {} not present", name)))
    }

    /// Decimal integer value
    pub fn int(&self, name: &str) -> Result<i64> {
        let value = self.required(name)?;
        value.trim().parse::<i64>().map_err(|_| {
            JtlError::Env(format!(
                "var `{}` has value `{}`, which is not integer",
                name, value
            ))
        })
    }

    /// Non-negative integer value that fits in `u32`
    pub fn uint(&self, name: &str) -> Result<u32> {
        let value = self.int(name)?;
        u32::try_from(value).map_err(|_| {
            JtlError::Env(format!(
                "var `{}` has value `{}`, which is not a non-negative 32-bit integer",
                name, value
            ))
        })
    }

    /// Descriptor number held by `name`, validated for `mode`
    pub fn descriptor_number(&self, name: &str, mode: FdMode) -> Result<i32> {
        let raw = self.int(name)?;
        let fd = i32::try_from(raw)
            .map_err(|_| JtlError::Descriptor(format!("var `{}` holds fd `{}`, which is out of range", name, raw)))?;
        crate::utils::fd::check_fd_mode(fd, mode).map_err(|e| {
            JtlError::Descriptor(format!("var `{}` contains fd `{}`: {}", name, fd, e))
        })?;
        Ok(fd)
    }

    /// Open the descriptor held by `name` as a stream
    pub fn descriptor(&self, name: &str, mode: FdMode) -> Result<File> {
        let fd = self.descriptor_number(name, mode)?;
        open_fd(fd, mode)
    }

    /// Raw bytes of a lowercase-hex value
    pub fn hex_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let value = self.required(name)?;
        decode_lower_hex(&value).map_err(|e| {
            JtlError::Env(format!("var `{}` contains '{}', which is not hex: {}", name, value, e))
        })
    }
}

/// Decode lowercase hex; odd length or any other character is an error
pub fn decode_lower_hex(data: &str) -> Result<Vec<u8>> {
    if let Some(bad) = data.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
        return Err(JtlError::Env(format!("unexpected character {:?}", bad)));
    }
    hex::decode(data).map_err(|e| JtlError::Env(e.to_string()))
}

pub fn resolve_required_env(name: &str) -> String {
    ProcessEnv::process().required(name).or_fatal()
}

pub fn resolve_int(name: &str) -> i64 {
    ProcessEnv::process().int(name).or_fatal()
}

pub fn resolve_descriptor(name: &str, mode: FdMode) -> File {
    ProcessEnv::process().descriptor(name, mode).or_fatal()
}

pub fn resolve_hex_bytes(name: &str) -> Vec<u8> {
    ProcessEnv::process().hex_bytes(name).or_fatal()
}
