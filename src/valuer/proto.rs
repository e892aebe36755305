/// Valuer control protocol and judge log model
///
/// Harness to valuer: a test count line, then one
/// `<test_id> <status_kind> <status_code>` line per finished test.
///
/// Valuer to harness: `RUN <test_id> <0|1>`, `LIVE-SCORE <score>`, and a
/// final `DONE <score> <0|1>` followed by the judge log:
///
/// ```text
/// DONE 100 1
/// 2
/// 1 Accepted OK 1
/// 2 Accepted OK 1
/// 0
/// ```
use crate::config::types::{JtlError, Result, StatusKind, SubtaskId, TestId};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

bitflags! {
    /// Which parts of a test may be shown to the contestant
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TestVisibleComponents: u32 {
        /// Test input data
        const TEST_DATA = 1;
        /// Solution output
        const OUTPUT = 2;
        /// Test answer
        const ANSWER = 4;
    }
}

bitflags! {
    /// Which parts of a subtask may be shown to the contestant
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SubtaskVisibleComponents: u32 {
        /// Score gained for this subtask
        const SCORE = 1;
    }
}

fn test_flags(bits: u32) -> Result<TestVisibleComponents> {
    TestVisibleComponents::from_bits(bits)
        .ok_or_else(|| JtlError::Protocol(format!("unknown test visibility flags {:#x}", bits)))
}

fn subtask_flags(bits: u32) -> Result<SubtaskVisibleComponents> {
    SubtaskVisibleComponents::from_bits(bits)
        .ok_or_else(|| JtlError::Protocol(format!("unknown subtask visibility flags {:#x}", bits)))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeLogTestEntry {
    pub test_id: TestId,
    /// Free-form single-token status, e.g. `WRONG_ANSWER`
    pub status_code: String,
    pub status_kind: StatusKind,
    pub components: TestVisibleComponents,
    /// Score contribution; kept in memory, not sent over the control channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl JudgeLogTestEntry {
    pub fn new(test_id: TestId, status_kind: StatusKind, status_code: impl Into<String>) -> Self {
        JudgeLogTestEntry {
            test_id,
            status_code: status_code.into(),
            status_kind,
            components: TestVisibleComponents::empty(),
            score: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeLogSubtaskEntry {
    pub subtask_id: SubtaskId,
    pub score: u32,
    pub components: SubtaskVisibleComponents,
}

/// Visibility-annotated record of a valuer session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeLog {
    pub name: String,
    pub tests: Vec<JudgeLogTestEntry>,
    pub subtasks: Vec<JudgeLogSubtaskEntry>,
}

impl JudgeLog {
    pub fn new(name: impl Into<String>) -> Self {
        JudgeLog {
            name: name.into(),
            ..JudgeLog::default()
        }
    }

    pub fn add_test_entry(&mut self, entry: JudgeLogTestEntry) {
        self.tests.push(entry);
    }

    pub fn add_subtask_entry(&mut self, entry: JudgeLogSubtaskEntry) {
        self.subtasks.push(entry);
    }

    /// Status codes travel as a single whitespace-free token
    pub fn validate(&self) -> Result<()> {
        for entry in &self.tests {
            check_status_code(&entry.status_code)?;
        }
        Ok(())
    }

    fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.tests.len())?;
        for entry in &self.tests {
            writeln!(
                out,
                "{} {} {} {}",
                entry.test_id,
                entry.status_kind,
                entry.status_code,
                entry.components.bits()
            )?;
        }
        writeln!(out, "{}", self.subtasks.len())?;
        for entry in &self.subtasks {
            writeln!(
                out,
                "{} {} {}",
                entry.subtask_id,
                entry.score,
                entry.components.bits()
            )?;
        }
        Ok(())
    }

    fn read_from<R: BufRead>(input: &mut R) -> Result<Self> {
        let mut log = JudgeLog::default();
        let test_count: usize = parse_field(&expect_line(input, "test entry count")?, "test entry count")?;
        for _ in 0..test_count {
            let line = expect_line(input, "test entry")?;
            let items = split_exact(&line, 4, "test entry")?;
            log.tests.push(JudgeLogTestEntry {
                test_id: parse_field(items[0], "test id")?,
                status_kind: items[1].parse()?,
                status_code: items[2].to_string(),
                components: test_flags(parse_field(items[3], "test flags")?)?,
                score: None,
            });
        }
        let subtask_count: usize =
            parse_field(&expect_line(input, "subtask entry count")?, "subtask entry count")?;
        for _ in 0..subtask_count {
            let line = expect_line(input, "subtask entry")?;
            let items = split_exact(&line, 3, "subtask entry")?;
            log.subtasks.push(JudgeLogSubtaskEntry {
                subtask_id: parse_field(items[0], "subtask id")?,
                score: parse_field(items[1], "subtask score")?,
                components: subtask_flags(parse_field(items[2], "subtask flags")?)?,
            });
        }
        Ok(log)
    }
}

pub fn check_status_code(code: &str) -> Result<()> {
    if code.is_empty() || code.chars().any(char::is_whitespace) {
        return Err(JtlError::Protocol(format!(
            "status code `{}` must be a single non-empty token",
            code
        )));
    }
    Ok(())
}

/// Message from the valuer to the harness
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuerResponse {
    Test {
        test_id: TestId,
        live: bool,
    },
    LiveScore {
        score: u32,
    },
    Finish {
        score: u32,
        treat_as_full: bool,
        judge_log: JudgeLog,
    },
}

impl ValuerResponse {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            ValuerResponse::Test { test_id, live } => {
                writeln!(out, "RUN {} {}", test_id, flag(*live))?;
            }
            ValuerResponse::LiveScore { score } => {
                writeln!(out, "LIVE-SCORE {}", score)?;
            }
            ValuerResponse::Finish {
                score,
                treat_as_full,
                judge_log,
            } => {
                writeln!(out, "DONE {} {}", score, flag(*treat_as_full))?;
                judge_log.write_to(out)?;
            }
        }
        out.flush()
    }

    /// Read the next response, `None` on a clean end of stream
    pub fn read_from<R: BufRead>(input: &mut R) -> Result<Option<Self>> {
        let line = match read_line(input)? {
            Some(line) => line,
            None => return Ok(None),
        };
        let items: Vec<&str> = line.split_ascii_whitespace().collect();
        let response = match items.as_slice() {
            ["RUN", test_id, live] => ValuerResponse::Test {
                test_id: parse_field(test_id, "RUN test id")?,
                live: parse_flag(live, "RUN live")?,
            },
            ["LIVE-SCORE", score] => ValuerResponse::LiveScore {
                score: parse_field(score, "LIVE-SCORE score")?,
            },
            ["DONE", score, full] => ValuerResponse::Finish {
                score: parse_field(score, "DONE score")?,
                treat_as_full: parse_flag(full, "DONE treat_as_full")?,
                judge_log: JudgeLog::read_from(input)?,
            },
            _ => {
                return Err(JtlError::Protocol(format!(
                    "unexpected valuer response `{}`",
                    line
                )))
            }
        };
        Ok(Some(response))
    }
}

/// Finished test reported to the valuer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDoneNotification {
    pub test_id: TestId,
    pub status_kind: StatusKind,
    pub status_code: String,
}

impl TestDoneNotification {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{} {} {}", self.test_id, self.status_kind, self.status_code)?;
        out.flush()
    }

    pub fn parse(line: &str) -> Result<Self> {
        let items = split_exact(line, 3, "test result")?;
        Ok(TestDoneNotification {
            test_id: parse_field(items[0], "test id")?,
            status_kind: items[1].parse()?,
            status_code: items[2].to_string(),
        })
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn parse_flag(item: &str, what: &str) -> Result<bool> {
    match item {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(JtlError::Protocol(format!(
            "{} must be 0 or 1, got `{}`",
            what, item
        ))),
    }
}

fn parse_field<T: std::str::FromStr>(item: &str, what: &str) -> Result<T> {
    item.trim()
        .parse()
        .map_err(|_| JtlError::Protocol(format!("{}: `{}` is not a number", what, item)))
}

fn split_exact<'a>(line: &'a str, count: usize, what: &str) -> Result<Vec<&'a str>> {
    let items: Vec<&str> = line.split_ascii_whitespace().collect();
    if items.len() != count {
        return Err(JtlError::Protocol(format!(
            "{}: expected {} items, got {}",
            what,
            count,
            items.len()
        )));
    }
    Ok(items)
}

/// Next non-blank line without its terminator, `None` at end of stream
pub(crate) fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(line.trim().to_string()));
        }
    }
}

fn expect_line<R: BufRead>(input: &mut R, what: &str) -> Result<String> {
    read_line(input)?.ok_or_else(|| JtlError::Protocol(format!("unexpected EOF, expected {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_log() -> JudgeLog {
        let mut log = JudgeLog::new("main");
        let mut first = JudgeLogTestEntry::new(1, StatusKind::Accepted, "OK");
        first.components.insert(TestVisibleComponents::TEST_DATA);
        log.add_test_entry(first);
        let mut second = JudgeLogTestEntry::new(2, StatusKind::Rejected, "WRONG_ANSWER");
        second.components = TestVisibleComponents::all();
        log.add_test_entry(second);
        log.add_test_entry(JudgeLogTestEntry::new(3, StatusKind::Skipped, "SKIPPED"));
        let mut subtask = JudgeLogSubtaskEntry {
            subtask_id: 1,
            score: 40,
            components: SubtaskVisibleComponents::empty(),
        };
        subtask.components.insert(SubtaskVisibleComponents::SCORE);
        log.add_subtask_entry(subtask);
        log
    }

    fn decode_all(data: &[u8]) -> Vec<ValuerResponse> {
        let mut input = Cursor::new(data);
        let mut out = Vec::new();
        while let Some(response) = ValuerResponse::read_from(&mut input).unwrap() {
            out.push(response);
        }
        out
    }

    #[test]
    fn test_done_block_layout() {
        let mut buf = Vec::new();
        ValuerResponse::Finish {
            score: 40,
            treat_as_full: false,
            judge_log: sample_log(),
        }
        .write_to(&mut buf)
        .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "DONE 40 0\n3\n1 Accepted OK 1\n2 Rejected WRONG_ANSWER 7\n3 Skipped SKIPPED 0\n1\n1 40 1\n"
        );
    }

    #[test]
    fn test_judge_log_round_trip() {
        let mut buf = Vec::new();
        let responses = vec![
            ValuerResponse::Test {
                test_id: 1,
                live: true,
            },
            ValuerResponse::LiveScore { score: 33 },
            ValuerResponse::Finish {
                score: 40,
                treat_as_full: false,
                judge_log: sample_log(),
            },
        ];
        for response in &responses {
            response.write_to(&mut buf).unwrap();
        }
        let decoded = decode_all(&buf);
        // The name is local to the valuer and does not travel.
        let mut expected = responses;
        if let ValuerResponse::Finish { judge_log, .. } = &mut expected[2] {
            judge_log.name.clear();
        }
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["RUN x 1\n", "RUN 1 2\n", "HELLO\n", "DONE 1 1\n2\n1 Accepted OK 1\n"] {
            let mut input = Cursor::new(bad.as_bytes());
            assert!(ValuerResponse::read_from(&mut input).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_unknown_flags_rejected() {
        assert!(test_flags(8).is_err());
        assert!(subtask_flags(2).is_err());
        assert_eq!(
            test_flags(5).unwrap(),
            TestVisibleComponents::TEST_DATA | TestVisibleComponents::ANSWER
        );
        let mut input = Cursor::new("DONE 0 0\n1\n1 Rejected WA 9\n0\n".as_bytes());
        assert!(ValuerResponse::read_from(&mut input).is_err());
    }

    #[test]
    fn test_notification_parse() {
        let note = TestDoneNotification::parse("4 InternalError CHECKER_FAILED").unwrap();
        assert_eq!(note.test_id, 4);
        assert_eq!(note.status_kind, StatusKind::InternalError);
        let mut buf = Vec::new();
        note.write_to(&mut buf).unwrap();
        assert_eq!(buf, b"4 InternalError CHECKER_FAILED\n");

        assert!(TestDoneNotification::parse("4 Passed OK").is_err());
        assert!(TestDoneNotification::parse("4 Accepted").is_err());
    }

    #[test]
    fn test_status_code_validation() {
        let mut log = sample_log();
        assert!(log.validate().is_ok());
        log.add_test_entry(JudgeLogTestEntry::new(4, StatusKind::Rejected, "TIME LIMIT"));
        assert!(log.validate().is_err());
    }
}
