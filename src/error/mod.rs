//! Error handling module
//!
//! Defines the error kinds raised by the config compiler, the key model and
//! the admin-repo collaborator, together with their process exit codes

pub mod types;

pub use types::*;
