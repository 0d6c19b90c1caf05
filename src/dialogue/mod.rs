pub mod event;
pub mod orchestrator;
pub mod session;
pub mod state;

pub use event::{SessionEvent, SideEffect};
pub use orchestrator::Orchestrator;
pub use session::DialogueSession;
pub use state::DialogueState;
