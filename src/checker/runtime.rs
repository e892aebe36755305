/// Checker runtime
///
/// A checker reads three parallel streams (test input, correct answer,
/// contestant answer) and ends with exactly one verdict. Failed reads are
/// attributed to whoever owns the stream: the problem package for the test
/// and correct answer, the contestant for their own answer.
use crate::checker::outcome::write_verdict;
use crate::checker::token::TokenReader;
use crate::config::env::{
    EnvResolver, ProcessEnv, JJS_CHECKER_COMMENT, JJS_CHECKER_OUT, JJS_CORR, JJS_SOL, JJS_TEST,
};
use crate::config::types::{Outcome, Result};
use crate::utils::fatal::{fatal, OrFatal};
use crate::utils::fd::FdMode;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Comments longer than this are cut and marked
pub const COMMENT_MAX_LEN: usize = 4096;

pub const TRUNCATION_MARKER: &str = "... (comment was truncated)";

static CHECKER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// One of the three checker input streams
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Test,
    Correct,
    Solution,
}

impl Stream {
    /// Verdict when this stream ends early or has leftover data
    pub fn fault_outcome(self) -> Outcome {
        match self {
            Stream::Solution => Outcome::PresentationError,
            Stream::Test | Stream::Correct => Outcome::CheckerLogicError,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Stream::Test => "test file",
            Stream::Correct => "correct answer",
            Stream::Solution => "provided answer",
        }
    }

    fn severity(self) -> &'static str {
        match self {
            Stream::Solution => "error",
            Stream::Test | Stream::Correct => "fatal",
        }
    }
}

/// Early termination carrying the verdict to report
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("checker stopped with {outcome}")]
pub struct Rejected {
    pub outcome: Outcome,
}

impl From<Outcome> for Rejected {
    fn from(outcome: Outcome) -> Self {
        Rejected { outcome }
    }
}

/// What checker logic returns: the verdict, or an early stop
pub type CheckResult = std::result::Result<Outcome, Rejected>;

/// Descriptors handed to a checker by the executor
pub struct CheckerEnv {
    pub test: File,
    pub correct: File,
    pub solution: File,
    pub verdict: File,
    pub comment: File,
}

impl CheckerEnv {
    pub fn resolve<F>(env: &EnvResolver<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(CheckerEnv {
            correct: env.descriptor(JJS_CORR, FdMode::Read)?,
            solution: env.descriptor(JJS_SOL, FdMode::Read)?,
            test: env.descriptor(JJS_TEST, FdMode::Read)?,
            verdict: env.descriptor(JJS_CHECKER_OUT, FdMode::Write)?,
            comment: env.descriptor(JJS_CHECKER_COMMENT, FdMode::Write)?,
        })
    }
}

/// Outputs left after the verdict was written
#[derive(Debug)]
pub struct CheckerReport<W> {
    pub outcome: Outcome,
    pub verdict: W,
    pub comments: W,
}

/// Initialized checker session
///
/// Ownership encodes the lifecycle. [`Checker::init`] builds the only
/// instance, and [`Checker::finish`] consumes it and never returns. Writing
/// the verdict through [`Checker::conclude`] moves the checker the same way,
/// so nothing can be read or commented afterwards:
///
/// ```compile_fail,E0382
/// use jtl::checker::Checker;
/// use jtl::Outcome;
/// use std::io::Cursor;
///
/// let mut checker = Checker::new(
///     Cursor::new("1"),
///     Cursor::new("1"),
///     Cursor::new("1"),
///     Vec::new(),
///     Vec::new(),
/// );
/// let _ = checker.conclude(Outcome::Ok);
/// checker.comment("after the verdict");
/// ```
pub struct Checker<R = BufReader<File>, W = File> {
    test: TokenReader<R>,
    correct: TokenReader<R>,
    solution: TokenReader<R>,
    verdict_out: W,
    comment_out: W,
}

impl Checker {
    /// Resolve all streams from the environment. Exits on any bad variable.
    ///
    /// Must be called at most once per process.
    pub fn init() -> Self {
        if CHECKER_INITIALIZED.swap(true, Ordering::SeqCst) {
            fatal("checker is initialized twice");
        }
        let env = CheckerEnv::resolve(&ProcessEnv::process()).or_fatal();
        log::debug!("checker streams resolved");
        Checker::from_env(env)
    }

    pub fn from_env(env: CheckerEnv) -> Self {
        Checker::new(
            BufReader::new(env.test),
            BufReader::new(env.correct),
            BufReader::new(env.solution),
            env.verdict,
            env.comment,
        )
    }
}

impl<R: BufRead, W: Write> Checker<R, W> {
    pub fn new(test: R, correct: R, solution: R, verdict_out: W, comment_out: W) -> Self {
        Checker {
            test: TokenReader::new(test),
            correct: TokenReader::new(correct),
            solution: TokenReader::new(solution),
            verdict_out,
            comment_out,
        }
    }

    fn reader(&mut self, stream: Stream) -> &mut TokenReader<R> {
        match stream {
            Stream::Test => &mut self.test,
            Stream::Correct => &mut self.correct,
            Stream::Solution => &mut self.solution,
        }
    }

    /// Next whitespace-delimited token, `None` when the stream is exhausted
    pub fn next_token(&mut self, stream: Stream) -> Option<String> {
        match self.reader(stream).next_token() {
            Ok(token) => token,
            Err(e) => {
                self.comment("check_utils: read failed");
                fatal(format!("failed to read {}: {}", stream.description(), e))
            }
        }
    }

    /// Read and parse the next token.
    ///
    /// End of stream or an unparseable token stops the checker with the
    /// stream's fault outcome.
    pub fn scan<T: FromStr>(&mut self, stream: Stream) -> std::result::Result<T, Rejected> {
        let token = match self.next_token(stream) {
            Some(token) => token,
            None => {
                self.comment(format!(
                    "{}: unexpected EOF when reading {}",
                    stream.severity(),
                    stream.description()
                ));
                return Err(stream.fault_outcome().into());
            }
        };
        token.parse::<T>().map_err(|_| {
            self.comment(format!(
                "{}: malformed token `{}` in {}",
                stream.severity(),
                token,
                stream.description()
            ));
            stream.fault_outcome().into()
        })
    }

    pub fn test_scan<T: FromStr>(&mut self) -> std::result::Result<T, Rejected> {
        self.scan(Stream::Test)
    }

    pub fn corr_scan<T: FromStr>(&mut self) -> std::result::Result<T, Rejected> {
        self.scan(Stream::Correct)
    }

    pub fn sol_scan<T: FromStr>(&mut self) -> std::result::Result<T, Rejected> {
        self.scan(Stream::Solution)
    }

    /// Require that only whitespace is left in `stream`
    pub fn check_eof(&mut self, stream: Stream) -> std::result::Result<(), Rejected> {
        let at_eof = match self.reader(stream).is_eof() {
            Ok(at_eof) => at_eof,
            Err(e) => fatal(format!("failed to read {}: {}", stream.description(), e)),
        };
        if at_eof {
            return Ok(());
        }
        self.comment(format!(
            "{}: {} has data yet",
            stream.severity(),
            stream.description()
        ));
        Err(stream.fault_outcome().into())
    }

    /// Append one diagnostic line to the comment channel
    pub fn comment(&mut self, text: impl Display) {
        let line = truncate_comment(text.to_string());
        if let Err(e) = writeln!(self.comment_out, "{}", line) {
            log::warn!("failed to write checker comment: {}", e);
        }
    }

    /// Write the verdict and hand back the output channels
    ///
    /// ```
    /// use jtl::checker::Checker;
    /// use jtl::Outcome;
    /// use std::io::Cursor;
    ///
    /// let mut checker = Checker::new(
    ///     Cursor::new("1"),
    ///     Cursor::new("1"),
    ///     Cursor::new("1"),
    ///     Vec::new(),
    ///     Vec::new(),
    /// );
    /// checker.comment("before the verdict");
    /// let report = checker.conclude(Outcome::Ok).unwrap();
    /// assert_eq!(report.verdict, b"outcome=Ok\n");
    /// assert_eq!(report.comments, b"before the verdict\n");
    /// ```
    pub fn conclude(mut self, outcome: Outcome) -> io::Result<CheckerReport<W>> {
        self.comment_out.flush()?;
        write_verdict(&mut self.verdict_out, outcome)?;
        log::debug!("checker verdict: {}", outcome);
        Ok(CheckerReport {
            outcome,
            verdict: self.verdict_out,
            comments: self.comment_out,
        })
    }

    /// Write the verdict and terminate the process
    pub fn finish(self, outcome: Outcome) -> ! {
        if let Err(e) = self.conclude(outcome) {
            fatal(format!("failed to write verdict: {}", e));
        }
        std::process::exit(0)
    }

    /// Run checker logic and write whatever verdict it reaches
    pub fn evaluate<F>(mut self, logic: F) -> io::Result<CheckerReport<W>>
    where
        F: FnOnce(&mut Self) -> CheckResult,
    {
        let outcome = logic(&mut self).unwrap_or_else(|rejected| rejected.outcome);
        self.conclude(outcome)
    }

    /// Run checker logic, write the verdict and terminate the process
    pub fn run<F>(mut self, logic: F) -> !
    where
        F: FnOnce(&mut Self) -> CheckResult,
    {
        let outcome = logic(&mut self).unwrap_or_else(|rejected| rejected.outcome);
        self.finish(outcome)
    }
}

fn truncate_comment(mut text: String) -> String {
    if text.len() < COMMENT_MAX_LEN {
        return text;
    }
    let mut cut = COMMENT_MAX_LEN - 1;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}
