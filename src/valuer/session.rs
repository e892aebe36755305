/// Valuer session and protocol driver
///
/// The driver owns all control I/O. Problem-specific scoring lives in a
/// [`Valuer`] implementation that only reacts to the session's callbacks:
///
/// 1. `init` with a fresh session, before the test count is known
/// 2. `begin` once the test count is read; must select at least one test
/// 3. `on_test_end` per finished test; must select another test or finish,
///    unless earlier selections are still outstanding
use crate::config::env::{EnvResolver, ProcessEnv, JJS_VALUER_COMMENT_PRIV, JJS_VALUER_COMMENT_PUB};
use crate::config::types::{JtlError, Result, TestId};
use crate::utils::fatal::OrFatal;
use crate::utils::fd::FdMode;
use crate::valuer::proto::{read_line, JudgeLog, JudgeLogTestEntry, TestDoneNotification, ValuerResponse};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, Write};

/// Driver progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInit,
    AwaitingTestCount,
    AwaitingBegin,
    Running,
    Finished,
}

/// Comment channels handed to a valuer by the executor
pub struct ValuerEnv {
    pub public_comments: File,
    pub private_comments: File,
}

impl ValuerEnv {
    pub fn resolve<F>(env: &EnvResolver<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ValuerEnv {
            public_comments: env.descriptor(JJS_VALUER_COMMENT_PUB, FdMode::Write)?,
            private_comments: env.descriptor(JJS_VALUER_COMMENT_PRIV, FdMode::Write)?,
        })
    }
}

/// State shared between the driver and a [`Valuer`]
pub struct ValuerSession<W> {
    state: SessionState,
    problem_test_count: u32,
    control: W,
    public_comments: Box<dyn Write>,
    private_comments: Box<dyn Write>,
    judge_log: JudgeLog,
    /// Tests requested but not yet reported back
    pending: BTreeSet<TestId>,
}

impl<W: Write> ValuerSession<W> {
    pub fn new(control: W, public_comments: Box<dyn Write>, private_comments: Box<dyn Write>) -> Self {
        ValuerSession {
            state: SessionState::AwaitingInit,
            problem_test_count: 0,
            control,
            public_comments,
            private_comments,
            judge_log: JudgeLog::default(),
            pending: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Total number of tests; zero until the driver has read it
    pub fn problem_test_count(&self) -> u32 {
        self.problem_test_count
    }

    /// Tests requested but not yet reported back
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Ask the harness to run `test_id`; `live` surfaces its progress early
    pub fn select_next_test(&mut self, test_id: TestId, live: bool) -> Result<()> {
        if !matches!(self.state, SessionState::AwaitingBegin | SessionState::Running) {
            return Err(JtlError::Contract(format!(
                "select_next_test called in state {:?}",
                self.state
            )));
        }
        if test_id < 1 || test_id > self.problem_test_count {
            return Err(JtlError::Contract(format!(
                "test {} is out of range 1..={}",
                test_id, self.problem_test_count
            )));
        }
        if self.pending.contains(&test_id) {
            return Err(JtlError::Contract(format!(
                "test {} is already requested",
                test_id
            )));
        }
        self.send(&ValuerResponse::Test { test_id, live })?;
        self.pending.insert(test_id);
        log::debug!("requested test {} (live: {})", test_id, live);
        Ok(())
    }

    /// Report a provisional score
    pub fn set_live_score(&mut self, score: u32) -> Result<()> {
        self.ensure_open("set_live_score")?;
        self.send(&ValuerResponse::LiveScore { score })
    }

    /// Send the final score and judge log, ending the session
    pub fn finish(&mut self, score: u32, treat_as_full: bool, judge_log: JudgeLog) -> Result<()> {
        self.ensure_open("finish")?;
        judge_log.validate()?;
        self.send(&ValuerResponse::Finish {
            score,
            treat_as_full,
            judge_log,
        })?;
        self.state = SessionState::Finished;
        log::info!("valuer finished with score {} (full: {})", score, treat_as_full);
        Ok(())
    }

    /// Judge log owned by the session, for valuers that build it here
    pub fn judge_log_mut(&mut self) -> &mut JudgeLog {
        &mut self.judge_log
    }

    pub fn take_judge_log(&mut self) -> JudgeLog {
        std::mem::take(&mut self.judge_log)
    }

    /// Append a line visible to the contestant
    pub fn comment_public(&mut self, text: impl Display) {
        write_comment(&mut self.public_comments, "public", text);
    }

    /// Append a line visible to judges only
    pub fn comment_private(&mut self, text: impl Display) {
        write_comment(&mut self.private_comments, "private", text);
    }

    pub fn into_control(self) -> W {
        self.control
    }

    fn ensure_open(&self, op: &str) -> Result<()> {
        match self.state {
            SessionState::AwaitingBegin | SessionState::Running => Ok(()),
            state => Err(JtlError::Contract(format!("{} called in state {:?}", op, state))),
        }
    }

    fn send(&mut self, response: &ValuerResponse) -> Result<()> {
        response.write_to(&mut self.control)?;
        Ok(())
    }

    fn flush_comments(&mut self) {
        for channel in [&mut self.public_comments, &mut self.private_comments] {
            if let Err(e) = channel.flush() {
                log::warn!("failed to flush valuer comments: {}", e);
            }
        }
    }
}

fn write_comment(out: &mut Box<dyn Write>, channel: &str, text: impl Display) {
    if let Err(e) = writeln!(out, "{}", text) {
        log::warn!("failed to write {} comment: {}", channel, e);
    }
}

/// Problem-specific scoring policy
pub trait Valuer {
    /// Load valuer configuration before the session starts
    fn init<W: Write>(&mut self, _session: &mut ValuerSession<W>) -> Result<()> {
        Ok(())
    }

    fn begin<W: Write>(&mut self, session: &mut ValuerSession<W>) -> Result<()>;

    fn on_test_end<W: Write>(
        &mut self,
        session: &mut ValuerSession<W>,
        entry: JudgeLogTestEntry,
    ) -> Result<()>;
}

/// Drive one valuer session over `input` until the valuer finishes
pub fn run_session<V, R, W>(valuer: &mut V, input: &mut R, session: &mut ValuerSession<W>) -> Result<()>
where
    V: Valuer,
    R: BufRead,
    W: Write,
{
    valuer.init(session)?;

    session.state = SessionState::AwaitingTestCount;
    let line = read_line(input)?
        .ok_or_else(|| JtlError::Protocol("control input closed before test count".to_string()))?;
    let count: u32 = line
        .parse()
        .map_err(|_| JtlError::Protocol(format!("test count `{}` is not a number", line)))?;
    if count == 0 {
        return Err(JtlError::Protocol("problem has no tests".to_string()));
    }
    session.problem_test_count = count;
    log::debug!("problem has {} tests", count);

    session.state = SessionState::AwaitingBegin;
    valuer.begin(session)?;
    if session.is_finished() {
        session.flush_comments();
        return Ok(());
    }
    if session.pending.is_empty() {
        return Err(JtlError::Contract(
            "begin returned without selecting a test".to_string(),
        ));
    }

    session.state = SessionState::Running;
    while !session.is_finished() {
        let line = read_line(input)?.ok_or_else(|| {
            JtlError::Protocol(format!(
                "control input closed with {} tests outstanding",
                session.pending.len()
            ))
        })?;
        let done = TestDoneNotification::parse(&line)?;
        if done.test_id < 1 || done.test_id > count {
            return Err(JtlError::Protocol(format!(
                "result for test {} is out of range 1..={}",
                done.test_id, count
            )));
        }
        if !session.pending.remove(&done.test_id) {
            return Err(JtlError::Protocol(format!(
                "result for test {} does not match a pending request",
                done.test_id
            )));
        }
        log::debug!("test {} finished: {}", done.test_id, done.status_kind);

        let entry = JudgeLogTestEntry::new(done.test_id, done.status_kind, done.status_code);
        let test_id = entry.test_id;
        valuer.on_test_end(session, entry)?;
        if !session.is_finished() && session.pending.is_empty() {
            return Err(JtlError::Contract(format!(
                "on_test_end for test {} neither selected a test nor finished",
                test_id
            )));
        }
    }
    session.flush_comments();
    Ok(())
}

/// Run `valuer` against stdin/stdout and the environment's comment channels.
///
/// Exits the process on any configuration or protocol fault.
pub fn run_valuer<V: Valuer>(mut valuer: V) {
    let env = ValuerEnv::resolve(&ProcessEnv::process()).or_fatal();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut session = ValuerSession::new(
        io::stdout().lock(),
        Box::new(env.public_comments),
        Box::new(env.private_comments),
    );
    run_session(&mut valuer, &mut input, &mut session).or_fatal();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::StatusKind;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    /// Requests every test up front, then sums accepted tests
    struct AllAtOnce {
        accepted: u32,
        seen: u32,
    }

    impl Valuer for AllAtOnce {
        fn begin<W: Write>(&mut self, session: &mut ValuerSession<W>) -> Result<()> {
            for test_id in 1..=session.problem_test_count() {
                session.select_next_test(test_id, false)?;
            }
            Ok(())
        }

        fn on_test_end<W: Write>(
            &mut self,
            session: &mut ValuerSession<W>,
            entry: JudgeLogTestEntry,
        ) -> Result<()> {
            self.seen += 1;
            if entry.status_kind.is_passed() {
                self.accepted += 1;
            }
            session.judge_log_mut().add_test_entry(entry);
            if self.seen == session.problem_test_count() {
                let log = session.take_judge_log();
                session.comment_private(format!("accepted {}", self.accepted));
                session.finish(self.accepted, false, log)?;
            }
            Ok(())
        }
    }

    /// Never selects anything after the first result
    struct Stalls;

    impl Valuer for Stalls {
        fn begin<W: Write>(&mut self, session: &mut ValuerSession<W>) -> Result<()> {
            session.select_next_test(1, false)
        }

        fn on_test_end<W: Write>(&mut self, _: &mut ValuerSession<W>, _: JudgeLogTestEntry) -> Result<()> {
            Ok(())
        }
    }

    fn session() -> (ValuerSession<Vec<u8>>, SharedBuf) {
        let private = SharedBuf::default();
        let session = ValuerSession::new(Vec::new(), Box::new(io::sink()), Box::new(private.clone()));
        (session, private)
    }

    #[test]
    fn test_outstanding_requests_allow_silent_callbacks() {
        let (mut session, private) = session();
        let mut valuer = AllAtOnce {
            accepted: 0,
            seen: 0,
        };
        let mut input = Cursor::new("3\n1 Accepted OK\n2 Rejected WA\n3 Accepted OK\n");
        run_session(&mut valuer, &mut input, &mut session).unwrap();
        assert!(session.is_finished());
        assert_eq!(private.text(), "accepted 2\n");
        let control = String::from_utf8(session.into_control()).unwrap();
        assert_eq!(
            control,
            "RUN 1 0\nRUN 2 0\nRUN 3 0\nDONE 2 0\n3\n1 Accepted OK 0\n2 Rejected WA 0\n3 Accepted OK 0\n0\n"
        );
    }

    #[test]
    fn test_stalled_callback_is_reported() {
        let (mut session, _) = session();
        let mut input = Cursor::new("2\n1 Accepted OK\n");
        let err = run_session(&mut Stalls, &mut input, &mut session).unwrap_err();
        assert!(err.to_string().contains("neither selected a test nor finished"));
    }

    #[test]
    fn test_zero_tests_rejected() {
        let (mut session, _) = session();
        let mut input = Cursor::new("0\n");
        assert!(run_session(&mut Stalls, &mut input, &mut session).is_err());
    }

    #[test]
    fn test_unknown_status_kind_is_fatal_error() {
        let (mut session, _) = session();
        let mut input = Cursor::new("2\n1 Passed OK\n");
        let err = run_session(&mut Stalls, &mut input, &mut session).unwrap_err();
        assert!(err.to_string().contains("unknown status kind"));
    }

    #[test]
    fn test_result_out_of_range() {
        let (mut session, _) = session();
        let mut input = Cursor::new("2\n5 Accepted OK\n");
        assert!(run_session(&mut Stalls, &mut input, &mut session).is_err());
    }

    #[test]
    fn test_closed_input_while_waiting() {
        let (mut session, _) = session();
        let mut input = Cursor::new("2\n");
        let err = run_session(&mut Stalls, &mut input, &mut session).unwrap_err();
        assert!(err.to_string().contains("1 tests outstanding"));
    }

    #[test]
    fn test_result_for_unrequested_test() {
        let (mut session, _) = session();
        let mut input = Cursor::new("3\n3 Accepted OK\n");
        let err = run_session(&mut Stalls, &mut input, &mut session).unwrap_err();
        assert!(matches!(err, JtlError::Protocol(_)), "{}", err);
        assert!(!session.is_finished());
    }

    #[test]
    fn test_duplicate_result() {
        let (mut session, _) = session();
        let mut valuer = AllAtOnce {
            accepted: 0,
            seen: 0,
        };
        let mut input = Cursor::new("2\n1 Accepted OK\n1 Accepted OK\n2 Accepted OK\n");
        let err = run_session(&mut valuer, &mut input, &mut session).unwrap_err();
        assert!(matches!(err, JtlError::Protocol(_)), "{}", err);
        assert_eq!(valuer.seen, 1);
        assert_eq!(session.outstanding(), 1);
    }

    #[test]
    fn test_pending_test_cannot_be_requested_twice() {
        let (mut session, _) = session();
        session.state = SessionState::Running;
        session.problem_test_count = 3;
        session.select_next_test(2, false).unwrap();
        assert!(session.select_next_test(2, false).is_err());
        assert_eq!(session.outstanding(), 1);
        assert_eq!(String::from_utf8(session.into_control()).unwrap(), "RUN 2 0\n");
    }

    #[test]
    fn test_session_guards() {
        let (mut session, _) = session();
        assert!(session.select_next_test(1, false).is_err());
        session.state = SessionState::AwaitingBegin;
        session.problem_test_count = 2;
        assert!(session.select_next_test(0, false).is_err());
        assert!(session.select_next_test(3, false).is_err());
        session.select_next_test(2, true).unwrap();
        session.set_live_score(50).unwrap();
        session.finish(100, true, JudgeLog::new("main")).unwrap();
        assert!(session.finish(100, true, JudgeLog::new("main")).is_err());
        assert!(session.set_live_score(1).is_err());
        let mut bad = JudgeLog::new("main");
        bad.add_test_entry(JudgeLogTestEntry::new(1, StatusKind::Accepted, ""));
        assert!(bad.validate().is_err());
    }
}
