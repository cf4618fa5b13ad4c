//! Error types for cmdtree

use crate::signature::ValueType;
use std::io;
use thiserror::Error;

/// Result type alias for cmdtree operations
pub type Result<T> = std::result::Result<T, CmdTreeError>;

/// Main error type for cmdtree
#[derive(Error, Debug)]
pub enum CmdTreeError {
    /// Malformed handler declarations
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Name collisions and broken tree declarations
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Failures while resolving or running a command chain
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Handler declaration errors, raised while a command set is collected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("Parameter name must not be empty")]
    EmptyName,

    #[error("Parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    #[error("Keyword-only marker is declared more than once")]
    DuplicateMarker,

    #[error("Required positional parameter '{param}' follows optional parameter '{after}'")]
    RequiredAfterOptional { param: String, after: String },

    #[error("Boolean flag '{0}' cannot take non-boolean choices")]
    BoolFlagChoices(String),

    #[error("Flags {flags:?} conflict with required positional parameter '{param}'")]
    FlagOnPositional { param: String, flags: Vec<String> },

    #[error("Invalid flag '{flag}' for parameter '{param}'")]
    InvalidFlag { param: String, flag: String },

    #[error("Flag '{0}' is used by more than one parameter")]
    DuplicateFlag(String),

    #[error("Literal type of parameter '{0}' has no members")]
    EmptyLiteral(String),

    #[error("Literal members of parameter '{0}' do not share a common type")]
    MixedLiteral(String),

    #[error("Default of parameter '{0}' is not one of its choices")]
    DefaultNotInChoices(String),

    #[error("Default of parameter '{param}' does not match its type {expected}")]
    DefaultTypeMismatch { param: String, expected: ValueType },
}

/// Command registration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("Command '{name}' is registered more than once{}", .parent.as_ref().map(|p| format!(" under '{p}'")).unwrap_or_default())]
    DuplicateName { name: String, parent: Option<String> },

    #[error("Invalid command name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Parent command #{0} is not declared")]
    UnknownParent(usize),

    #[error("Command '{0}' has no parser and cannot take sub-commands")]
    NotComposable(String),
}

/// Category of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token matched no argument, flag or sub-command
    UnknownArgument,
    /// A required argument was not supplied
    MissingArgument,
    /// A value failed type coercion
    InvalidValue,
    /// A value is outside the argument's choice set
    InvalidChoice,
    /// `--help` was requested; the message carries the rendered help
    HelpRequested,
    /// Anything else the parser rejected
    Other,
}

/// Malformed user input. No handler runs when this is returned.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The offending token, when the parser could identify one
    pub token: Option<String>,
    pub message: String,
    pub usage: String,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        token: Option<String>,
        message: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        ParseError {
            kind,
            token,
            message: message.into(),
            usage: usage.into(),
        }
    }

    /// Whether this error only carries requested help text
    pub fn is_help(&self) -> bool {
        self.kind == ParseErrorKind::HelpRequested
    }
}

/// Errors raised while resolving or executing a command chain
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command '{0}' is disabled")]
    CommandDisabled(String),

    #[error("Broken command chain ({reason}): {}", .chain.join(" -> "))]
    ChainIntegrity { reason: String, chain: Vec<String> },

    #[error("Command '{command}' failed at chain position {position}: {source}")]
    Execution {
        position: usize,
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Specialized result type for signature analysis
pub type SignatureResult<T> = std::result::Result<T, SignatureError>;

/// Specialized result type for registration
pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;

/// Specialized result type for dispatch
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Whether a dispatch failure left every handler untouched
pub fn is_recoverable(err: &DispatchError) -> bool {
    matches!(
        err,
        DispatchError::Parse(_) | DispatchError::CommandDisabled(_) | DispatchError::UnknownCommand(_)
    )
}
