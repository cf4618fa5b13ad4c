//! Parser synthesis and parsing
//!
//! This module builds clap parsers from argument specifications, composes
//! them into sub-command trees, and turns token lists into namespaces.

pub mod complete;
pub mod namespace;
pub mod synth;
pub mod tree;

// Re-export main types
pub use complete::*;
pub use namespace::*;
pub use synth::{synthesize, Parser};
pub use tree::*;
