pub mod orchestrator;
pub mod session;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::{ChatOrchestrator, ChatReply};
pub use session::ChatSession;
pub use validator::{OutputValidator, ValidationVerdict};
