pub mod config;
pub mod extract;
pub mod orchestrator;
pub mod package;
