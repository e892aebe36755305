/// Partial-credit valuer: every test runs, score is the accepted share
use crate::config::types::Result;
use crate::valuer::proto::{JudgeLogTestEntry, TestVisibleComponents};
use crate::valuer::session::{Valuer, ValuerSession};
use std::io::Write;

#[derive(Debug, Default)]
pub struct PartialValuer {
    accepted: u32,
}

impl PartialValuer {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(&self, total: u32) -> u32 {
        (u64::from(self.accepted) * 100 / u64::from(total)) as u32
    }
}

impl Valuer for PartialValuer {
    fn begin<W: Write>(&mut self, session: &mut ValuerSession<W>) -> Result<()> {
        session.judge_log_mut().name = "main".to_string();
        session.select_next_test(1, true)
    }

    fn on_test_end<W: Write>(
        &mut self,
        session: &mut ValuerSession<W>,
        mut entry: JudgeLogTestEntry,
    ) -> Result<()> {
        let total = session.problem_test_count();
        let test_id = entry.test_id;
        if entry.status_kind.is_passed() {
            self.accepted += 1;
            entry.score = Some(1);
        } else {
            session.comment_private(format!("test {}: {}", test_id, entry.status_code));
            entry.score = Some(0);
        }
        entry.components.insert(TestVisibleComponents::TEST_DATA);
        session.judge_log_mut().add_test_entry(entry);

        let score = self.score(total);
        session.set_live_score(score)?;
        if test_id < total {
            return session.select_next_test(test_id + 1, true);
        }
        session.comment_public(format!("passed {} of {} tests", self.accepted, total));
        let judge_log = session.take_judge_log();
        session.finish(score, self.accepted == total, judge_log)
    }
}
