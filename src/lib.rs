//! Dockyard - Container image build orchestrator
//!
//! Logs into every configured registry inside a throwaway credential
//! directory, then runs the image build, optionally reusing a previous
//! image as layer cache.

pub mod cli;
pub mod config;
pub mod docker;
pub mod error;
pub mod orchestration;
pub mod registry;
pub mod workspace;

pub use error::{DockyardError, DockyardResult};
pub use orchestration::{BuildOptions, BuildOrchestrator};
