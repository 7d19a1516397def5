//! CLI command implementations

pub mod build;
pub mod config;
pub mod registries;
pub mod version;

pub use build::execute as build;
pub use config::execute as config;
pub use registries::execute as registries;
pub use version::execute as version;
