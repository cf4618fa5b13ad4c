//! cmdtree - Declarative command trees with chained dispatch
//!
//! cmdtree turns handler declarations into a hierarchy of commands with
//! synthesized argument parsers. A single parse over the full token list
//! identifies the deepest matched command, and the handlers from the root
//! down to it run in order.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod signature;

// Re-export commonly used types
pub use error::{CmdTreeError, DispatchError, ParseError, RegistrationError, Result, SignatureError};
pub use registry::{Call, Command, CommandId, CommandMetadata, CommandSet, CommandSetBuilder, Handler};
pub use signature::{Annotation, Param, ParamType, Signature, Value};

/// Current version of cmdtree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
