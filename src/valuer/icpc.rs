/// ICPC-style valuer: tests run in order and the first failure stops judging
use crate::config::types::Result;
use crate::valuer::proto::{JudgeLog, JudgeLogTestEntry, TestVisibleComponents};
use crate::valuer::session::{Valuer, ValuerSession};
use std::io::Write;

pub const FULL_SCORE: u32 = 100;

pub struct IcpcValuer {
    judge_log: JudgeLog,
}

impl IcpcValuer {
    pub fn new() -> Self {
        IcpcValuer {
            judge_log: JudgeLog::new("main"),
        }
    }
}

impl Default for IcpcValuer {
    fn default() -> Self {
        Self::new()
    }
}

impl Valuer for IcpcValuer {
    fn begin<W: Write>(&mut self, session: &mut ValuerSession<W>) -> Result<()> {
        session.select_next_test(1, true)
    }

    fn on_test_end<W: Write>(
        &mut self,
        session: &mut ValuerSession<W>,
        mut entry: JudgeLogTestEntry,
    ) -> Result<()> {
        let test_id = entry.test_id;
        let passed = entry.status_kind.is_passed();
        let status_code = entry.status_code.clone();

        entry.score = Some(0);
        if passed {
            entry.components.insert(TestVisibleComponents::TEST_DATA);
        } else {
            entry.components = TestVisibleComponents::all();
        }
        self.judge_log.add_test_entry(entry);

        if !passed {
            session.comment_public(format!(
                "solution failed on test {}: (status {})",
                test_id, status_code
            ));
            return session.finish(0, false, std::mem::take(&mut self.judge_log));
        }
        if test_id == session.problem_test_count() {
            session.comment_public("ok, all tests passed");
            return session.finish(FULL_SCORE, true, std::mem::take(&mut self.judge_log));
        }
        session.select_next_test(test_id + 1, true)
    }
}
