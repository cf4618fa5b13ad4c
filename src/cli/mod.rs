//! CLI interface
//!
//! This module handles the line front door (shortcuts, tokenizing, one-shot
//! dispatch), help rendering, completion, and the `cmdtree` binary.

pub mod app;
pub mod demo;
pub mod help;

// Re-export main types
pub use app::*;
pub use help::*;
