//! Application layer for Armin: send orchestration, secondary capability
//! calls and the session use case the presentation layer drives.

pub mod capability;
pub mod chat_session;
pub mod notifier;
pub mod orchestrator;

pub use capability::CapabilityService;
pub use chat_session::ChatSession;
pub use notifier::Notifier;
pub use orchestrator::{ChatEvent, ChatOrchestrator, SendOutcome, SendPhase, SendRequest};
