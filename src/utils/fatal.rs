/// Fail-fast handling for launch/integration faults
///
/// Missing environment, bad descriptors, wrong seed lengths and protocol
/// desyncs mean the harness and the problem package disagree about the
/// contract. There is no recovery path: report on stderr and exit.
use std::fmt::Display;

/// Exit status used for every fatal integration fault
pub const FATAL_EXIT_CODE: i32 = 1;

/// Print a diagnostic to stderr and terminate the process
pub fn fatal(message: impl Display) -> ! {
    log::error!("{}", message);
    eprintln!("fatal error: {}", message);
    std::process::exit(FATAL_EXIT_CODE)
}

/// Unwrap a result or terminate the process with its error
pub trait OrFatal<T> {
    fn or_fatal(self) -> T;
}

impl<T, E: Display> OrFatal<T> for std::result::Result<T, E> {
    fn or_fatal(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => fatal(err),
        }
    }
}
