//! Command declarations
//!
//! A [`Command`] wraps a handler with the settings that turn it into an
//! invocable command. Settings are layered: each call refines the fields
//! it names and leaves every other field alone.

use crate::config::ShellConfig;
use crate::error::{RegistrationError, Result};
use crate::parser::{synthesize, Parser, SharedCompleter};
use crate::registry::{Call, CommandInfo, Handler, HandlerResult, HelpProvider};
use crate::signature::{analyze, Signature};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Anything that can describe itself as a command when its owner is built
pub trait CommandInfoSource: Send + Sync {
    fn command_info(&self, config: &ShellConfig) -> Result<CommandInfo>;
}

/// Optional command settings; unset fields leave earlier settings in place
#[derive(Clone, Default)]
pub struct CommandAttrs {
    pub name: Option<String>,
    pub doc: Option<String>,
    pub category: Option<String>,
    pub parser: Option<clap::Command>,
    pub completer: Option<SharedCompleter>,
    pub help_provider: Option<HelpProvider>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
}

impl CommandAttrs {
    /// Overlay `other` on top of these settings
    pub fn merge(&mut self, other: CommandAttrs) {
        self.name = other.name.or(self.name.take());
        self.doc = other.doc.or(self.doc.take());
        self.category = other.category.or(self.category.take());
        self.parser = other.parser.or(self.parser.take());
        self.completer = other.completer.or(self.completer.take());
        self.help_provider = other.help_provider.or(self.help_provider.take());
        self.hidden = other.hidden.or(self.hidden);
        self.disabled = other.disabled.or(self.disabled);
    }
}

/// A handler declared with a signature, ready to be collected
#[derive(Clone)]
pub struct Command {
    ident: String,
    handler: Handler,
    signature: Signature,
    attrs: CommandAttrs,
}

impl Command {
    /// Declare a command; `ident` is the function identifier the name derives from
    pub fn new(ident: impl Into<String>, handler: Handler) -> Self {
        Command {
            ident: ident.into(),
            handler,
            signature: Signature::new(),
            attrs: CommandAttrs::default(),
        }
    }

    /// Declare a command around a synchronous closure
    pub fn from_fn<F>(ident: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Call) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(ident, Handler::sync(f))
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn attrs(&self) -> &CommandAttrs {
        &self.attrs
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.attrs.name = Some(name.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.attrs.doc = Some(doc.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.attrs.category = Some(category.into());
        self
    }

    /// Use a hand-built parser instead of synthesizing one from the signature
    pub fn parser(mut self, parser: clap::Command) -> Self {
        self.attrs.parser = Some(parser);
        self
    }

    pub fn completer(mut self, completer: SharedCompleter) -> Self {
        self.attrs.completer = Some(completer);
        self
    }

    pub fn help_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(bool) -> String + Send + Sync + 'static,
    {
        self.attrs.help_provider = Some(Arc::new(provider));
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.attrs.hidden = Some(hidden);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.attrs.disabled = Some(disabled);
        self
    }

    /// Apply a batch of settings on top of the current ones
    pub fn with(mut self, attrs: CommandAttrs) -> Self {
        self.attrs.merge(attrs);
        self
    }

    /// Resolve the command name from the explicit name or the identifier
    pub fn resolve_name(&self, prefix: &str) -> std::result::Result<String, RegistrationError> {
        match &self.attrs.name {
            Some(name) => validate_name(name).map(|_| name.clone()),
            None => canonical_name(&self.ident, prefix),
        }
    }
}

impl CommandInfoSource for Command {
    fn command_info(&self, config: &ShellConfig) -> Result<CommandInfo> {
        let name = self.resolve_name(&config.command_prefix)?;

        let parser = match &self.attrs.parser {
            Some(manual) => Parser::manual(manual.clone()),
            None => {
                let specs = analyze(&self.signature).map_err(|err| {
                    warn!(command = %name, error = %err, "rejected handler signature");
                    err
                })?;
                synthesize(&name, specs, self.attrs.doc.as_deref())
            }
        };

        Ok(CommandInfo {
            name,
            aliases: Vec::new(),
            summary: None,
            handler: self.handler.clone(),
            parser: Some(parser),
            doc: self.attrs.doc.clone(),
            help_provider: self.attrs.help_provider.clone(),
            category: self.attrs.category.clone(),
            completer: self.attrs.completer.clone(),
            hidden: self.attrs.hidden.unwrap_or(false),
            disabled: self.attrs.disabled.unwrap_or(false),
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("ident", &self.ident)
            .field("name", &self.attrs.name)
            .field("params", &self.signature.params.len())
            .field("manual_parser", &self.attrs.parser.is_some())
            .finish()
    }
}

/// A plain function that receives its tokens verbatim
#[derive(Clone)]
pub struct FunctionDecl {
    pub ident: String,
    pub doc: Option<String>,
    pub handler: Handler,
}

impl FunctionDecl {
    pub fn new(ident: impl Into<String>, doc: Option<&str>, handler: Handler) -> Self {
        FunctionDecl {
            ident: ident.into(),
            doc: doc.map(str::to_string),
            handler,
        }
    }

    /// Derive metadata from the function's own identifier and doc string
    pub fn into_info(self, config: &ShellConfig) -> Result<CommandInfo> {
        let name = canonical_name(&self.ident, &config.command_prefix)?;
        let mut info = CommandInfo::new(name, self.handler);
        info.doc = self.doc;
        Ok(info)
    }
}

/// Strip the conventional prefix from a function identifier: `do_help` -> `help`
pub fn canonical_name(ident: &str, prefix: &str) -> std::result::Result<String, RegistrationError> {
    let name = ident.strip_prefix(prefix).ok_or_else(|| RegistrationError::InvalidName {
        name: ident.to_string(),
        reason: format!("command functions must start with '{}'", prefix),
    })?;
    validate_name(name)?;
    Ok(name.to_string())
}

pub(crate) fn validate_name(name: &str) -> std::result::Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(RegistrationError::InvalidName {
            name: name.to_string(),
            reason: "names cannot start with '-' or contain whitespace".to_string(),
        });
    }
    Ok(())
}
