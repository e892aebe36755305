/// Verdict file codec
///
/// The checker writes a single `outcome=<name>` line to its verdict
/// channel; the harness parses it back with [`parse_verdict`].
use crate::config::types::Outcome;
use std::io::{self, Write};
use thiserror::Error;

pub const OUTCOME_TAG: &str = "outcome";

/// Verdict file parse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerdictError {
    #[error("line {line}: expected `key=value`")]
    Malformed { line: usize },

    #[error("line {line}: unknown tag `{tag}`")]
    UnknownTag { line: usize, tag: String },

    #[error("tag `{tag}` is defined twice")]
    TagRedefined { tag: String },

    #[error("tag `{tag}` is missing")]
    TagMissing { tag: String },

    #[error("tag `{tag}` has invalid value `{value}`")]
    TagFormat { tag: String, value: String },
}

/// Write the verdict line and flush
pub fn write_verdict<W: Write>(out: &mut W, outcome: Outcome) -> io::Result<()> {
    writeln!(out, "{}={}", OUTCOME_TAG, outcome)?;
    out.flush()
}

/// Parse a verdict file. Blank lines are ignored.
pub fn parse_verdict(data: &str) -> Result<Outcome, VerdictError> {
    let mut outcome = None;
    for (line_id, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (tag, value) = line
            .split_once('=')
            .ok_or(VerdictError::Malformed { line: line_id })?;
        let tag = tag.trim();
        let value = value.trim();
        match tag {
            OUTCOME_TAG => {
                let parsed: Outcome = value.parse().map_err(|_| VerdictError::TagFormat {
                    tag: tag.to_string(),
                    value: value.to_string(),
                })?;
                if outcome.replace(parsed).is_some() {
                    return Err(VerdictError::TagRedefined {
                        tag: tag.to_string(),
                    });
                }
            }
            _ => {
                return Err(VerdictError::UnknownTag {
                    line: line_id,
                    tag: tag.to_string(),
                })
            }
        }
    }
    outcome.ok_or_else(|| VerdictError::TagMissing {
        tag: OUTCOME_TAG.to_string(),
    })
}
