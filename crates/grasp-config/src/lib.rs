//! Configuration system for the grasp VR interaction workspace.
//!
//! Provides runtime-configurable interaction settings that persist to disk as
//! RON files. Supports CLI overrides via clap, hot-reload detection, and
//! forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GestureButton, InputConfig, InteractionConfig, SessionConfig,
    TriggerFunction,
};
pub use error::ConfigError;
