//! Command metadata registry
//!
//! This module turns handler declarations into uniform command records,
//! collects them per owner, and attaches sub-commands beneath their parents.

pub mod collect;
pub mod command;
pub mod handler;
pub mod metadata;

pub use collect::*;
pub use command::*;
pub use handler::*;
pub use metadata::*;
