//! confedit core - shared types for the configuration editor
//!
//! This crate provides the configuration identity types, the settings layer,
//! the error type and the process-wide state store that the editor plugin
//! reads from and dispatches into.

pub mod binding;
pub mod config;
pub mod error;
pub mod state;

#[cfg(test)]
mod state_test;

// Re-export commonly used types
pub use binding::{BoundConfiguration, ConfigurationIdentity, EditorMode, DEFAULT_FORMAT};
pub use config::{EditorSettings, LookupSettings, Settings};
pub use error::{ConfEditError, ErrorSeverity, Result};
pub use state::{Action, ConfigState, CurrentEnv, InMemoryStore, StateStore};
