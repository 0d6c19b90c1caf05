pub mod config;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod parser;
pub mod plan;
pub mod speech;
pub mod store;

pub use config::PlannerConfig;
pub use dialogue::Orchestrator;
