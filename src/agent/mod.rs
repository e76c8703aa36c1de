//! Conversation orchestration: the tool-use loop and the session around it.

pub mod orchestrator;
pub mod session;

pub use orchestrator::{Orchestrator, QueryOutcome};
pub use session::{run_session, SessionEvent};
