//! Helpers for maintaining Unreal Engine projects.
//!
//! The CLI lives in `main.rs`; everything it does goes through [`api`].

pub mod api;
pub mod bundled;
pub mod config;
pub mod errors;
pub mod preview;
pub mod project;
pub mod prompt;
pub mod template;
pub mod transactions;
pub mod vfs;
