// Screening dialogue: explicit session state machine driven by the completion service.
// All free-text verdict parsing lives in verdict.rs.

pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod session;
pub mod verdict;

pub use engine::{DialogueConfig, DialogueEngine, DialogueReply};
pub use session::{ConversationSession, SessionSummary};
