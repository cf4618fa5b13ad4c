//! Handler signatures
//!
//! This module holds the declaration types handlers use to describe their
//! parameters, and the analyzer that normalizes them into argument
//! specifications.

pub mod analyze;
pub mod types;

// Re-export main types
pub use analyze::*;
pub use types::*;
