/// Token-by-token answer comparison
///
/// Walks the correct answer and the contestant answer in lockstep. The first
/// difference ends the check with `WrongAnswer`, including a missing or an
/// extra token on the contestant side.
use crate::checker::compare::{compare_epsilon, compare_strings_ignore_case, is_float_token};
use crate::checker::runtime::{CheckResult, Checker, Stream};
use crate::config::types::Outcome;
use std::io::{BufRead, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompareOptions {
    /// Tolerance for tokens of the form `[-]digits[.digits]`
    pub epsilon: Option<f64>,
    pub ignore_case: bool,
}

/// Whether `actual` matches `expected` under `opts`
pub fn compare_tokens(expected: &str, actual: &str, opts: &CompareOptions) -> bool {
    if let Some(epsilon) = opts.epsilon {
        if is_float_token(expected) {
            return match (expected.parse::<f64>(), actual.parse::<f64>()) {
                (Ok(e), Ok(a)) => compare_epsilon(e, a, epsilon),
                _ => false,
            };
        }
    }
    if opts.ignore_case {
        compare_strings_ignore_case(expected, actual)
    } else {
        expected == actual
    }
}

pub fn check_tokens<R, W>(checker: &mut Checker<R, W>, opts: &CompareOptions) -> CheckResult
where
    R: BufRead,
    W: Write,
{
    let mut position = 0usize;
    loop {
        let expected = checker.next_token(Stream::Correct);
        let actual = checker.next_token(Stream::Solution);
        match (expected, actual) {
            (None, None) => break,
            (Some(expected), None) => {
                checker.comment(format!(
                    "error: early EOF in actual answer on position {}",
                    position
                ));
                checker.comment(format!("note: next expected token was {}", expected));
                return Ok(Outcome::WrongAnswer);
            }
            (None, Some(actual)) => {
                checker.comment(format!(
                    "error: actual answer contains additional tokens, starting from {}",
                    position
                ));
                checker.comment(format!("note: next actual token was {}", actual));
                return Ok(Outcome::WrongAnswer);
            }
            (Some(expected), Some(actual)) => {
                if !compare_tokens(&expected, &actual, opts) {
                    checker.comment(format!("error: token mismatch on position {}", position));
                    checker.comment(format!("note: expected {}, got {}", expected, actual));
                    return Ok(Outcome::WrongAnswer);
                }
            }
        }
        position += 1;
    }
    checker.comment(format!("success: {} tokens", position));
    Ok(Outcome::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(correct: &'static str, solution: &'static str, opts: CompareOptions) -> (Outcome, String) {
        let checker = Checker::new(
            Cursor::new(""),
            Cursor::new(correct),
            Cursor::new(solution),
            Vec::new(),
            Vec::new(),
        );
        let report = checker.evaluate(|c| check_tokens(c, &opts)).unwrap();
        (report.outcome, String::from_utf8(report.comments).unwrap())
    }

    #[test]
    fn test_equal_answers() {
        let (outcome, comments) = run("42", "42\n", CompareOptions::default());
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(comments, "success: 1 tokens\n");
    }

    #[test]
    fn test_different_answers() {
        let (outcome, comments) = run("42", "43", CompareOptions::default());
        assert_eq!(outcome, Outcome::WrongAnswer);
        assert!(comments.contains("expected 42, got 43"));
    }

    #[test]
    fn test_extra_token() {
        let (outcome, comments) = run("42", "42 7", CompareOptions::default());
        assert_eq!(outcome, Outcome::WrongAnswer);
        assert!(comments.contains("additional tokens, starting from 1"));
    }

    #[test]
    fn test_missing_token() {
        let (outcome, comments) = run("1 2", "1", CompareOptions::default());
        assert_eq!(outcome, Outcome::WrongAnswer);
        assert!(comments.contains("early EOF in actual answer on position 1"));
        assert!(comments.contains("next expected token was 2"));
    }

    #[test]
    fn test_whitespace_layout_is_ignored() {
        let (outcome, _) = run("1 2\n3", "\n1\n\n2 3  \n", CompareOptions::default());
        assert_eq!(outcome, Outcome::Ok);
    }

    #[test]
    fn test_epsilon_applies_to_numbers() {
        let opts = CompareOptions {
            epsilon: Some(0.001),
            ignore_case: false,
        };
        assert!(compare_tokens("1000.0", "1000.5", &opts));
        assert!(compare_tokens("-0.5", "-0.5004", &opts));
        assert!(!compare_tokens("1000.0", "nan", &opts));
        assert!(!compare_tokens("1.0", "1", &CompareOptions::default()));
    }

    #[test]
    fn test_ignore_case() {
        let opts = CompareOptions {
            epsilon: None,
            ignore_case: true,
        };
        let (outcome, _) = run("YES no", "yes NO", opts);
        assert_eq!(outcome, Outcome::Ok);
        let (outcome, _) = run("YES", "yes", CompareOptions::default());
        assert_eq!(outcome, Outcome::WrongAnswer);
    }
}
