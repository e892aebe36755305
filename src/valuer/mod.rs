//! Valuer runtime
//!
//! Fixed control protocol driver plus the built-in scoring policies.

pub mod icpc;
pub mod partial;
pub mod proto;
pub mod session;

pub use icpc::IcpcValuer;
pub use partial::PartialValuer;
pub use proto::{
    JudgeLog, JudgeLogSubtaskEntry, JudgeLogTestEntry, SubtaskVisibleComponents,
    TestDoneNotification, TestVisibleComponents, ValuerResponse,
};
pub use session::{run_session, run_valuer, SessionState, Valuer, ValuerEnv, ValuerSession};
