/// Core types shared by the checker, testgen and valuer runtimes
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 1-based test identifier, as used on the valuer control protocol
pub type TestId = u32;

/// Subtask identifier in judge logs
pub type SubtaskId = u32;

/// Checker verdict for one test - STABLE TAXONOMY
/// Wire names are the exact strings written after `outcome=`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Contestant answer is correct
    Ok,
    /// Contestant answer is wrong
    WrongAnswer,
    /// Contestant answer is malformed
    PresentationError,
    /// Checker or problem package is broken
    CheckerLogicError,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Ok,
        Outcome::WrongAnswer,
        Outcome::PresentationError,
        Outcome::CheckerLogicError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "Ok",
            Outcome::WrongAnswer => "WrongAnswer",
            Outcome::PresentationError => "PresentationError",
            Outcome::CheckerLogicError => "CheckerLogicError",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = JtlError;

    fn from_str(s: &str) -> Result<Self> {
        Outcome::ALL
            .iter()
            .copied()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| JtlError::Protocol(format!("unknown checker outcome `{}`", s)))
    }
}

/// Valuer-facing classification of a single test result
/// Closed set: anything else on the wire is a protocol desync
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Accepted,
    Rejected,
    InternalError,
    Skipped,
}

impl StatusKind {
    pub const ALL: [StatusKind; 4] = [
        StatusKind::Accepted,
        StatusKind::Rejected,
        StatusKind::InternalError,
        StatusKind::Skipped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Accepted => "Accepted",
            StatusKind::Rejected => "Rejected",
            StatusKind::InternalError => "InternalError",
            StatusKind::Skipped => "Skipped",
        }
    }

    /// Only `Accepted` counts as passed for continuation decisions
    pub fn is_passed(self) -> bool {
        self == StatusKind::Accepted
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = JtlError;

    fn from_str(s: &str) -> Result<Self> {
        StatusKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| JtlError::Protocol(format!("unknown status kind `{}`", s)))
    }
}

/// Error types for the judge runtimes
#[derive(Error, Debug)]
pub enum JtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    Env(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Contract violation: {0}")]
    Contract(String),
}

impl From<nix::errno::Errno> for JtlError {
    fn from(err: nix::errno::Errno) -> Self {
        JtlError::Descriptor(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JtlError>;
