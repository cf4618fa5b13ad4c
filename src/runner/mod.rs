//! Dispatch engine
//!
//! This module rebuilds the matched command chain after a parse and runs it
//! from root to leaf.

pub mod chain;
pub mod dispatch;

pub use chain::*;
pub use dispatch::*;
