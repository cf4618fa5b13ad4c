//! Command metadata records

use crate::parser::{Parser, SharedCompleter};
use crate::registry::Handler;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifier of a command within its command set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub(crate) const fn new(index: usize) -> Self {
        CommandId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Produces help text; the flag asks for the verbose form
pub type HelpProvider = Arc<dyn Fn(bool) -> String + Send + Sync>;

/// Metadata a declaration produces before it is placed in a command set
#[derive(Clone)]
pub struct CommandInfo {
    pub name: String,
    /// Alternative names a sub-command answers to
    pub aliases: Vec<String>,
    /// One-line help shown in the parent's sub-command list
    pub summary: Option<String>,
    pub handler: Handler,
    pub parser: Option<Parser>,
    pub doc: Option<String>,
    pub help_provider: Option<HelpProvider>,
    pub category: Option<String>,
    pub completer: Option<SharedCompleter>,
    pub hidden: bool,
    pub disabled: bool,
}

impl CommandInfo {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        CommandInfo {
            name: name.into(),
            aliases: Vec::new(),
            summary: None,
            handler,
            parser: None,
            doc: None,
            help_provider: None,
            category: None,
            completer: None,
            hidden: false,
            disabled: false,
        }
    }
}

impl fmt::Debug for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInfo")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("handler", &self.handler)
            .field("parser", &self.parser.as_ref().map(Parser::name))
            .field("category", &self.category)
            .field("hidden", &self.hidden)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// Visibility and enablement, readable while dispatches are running
#[derive(Debug, Default)]
struct CommandFlags {
    hidden: AtomicBool,
    disabled: AtomicBool,
}

/// The registry record describing one invocable command
///
/// Everything except the hidden/disabled flags is fixed once the command
/// set is built.
#[derive(Clone)]
pub struct CommandMetadata {
    id: CommandId,
    parent: Option<CommandId>,
    name: String,
    aliases: Vec<String>,
    summary: Option<String>,
    handler: Handler,
    parser: Option<Parser>,
    doc: Option<String>,
    help_provider: Option<HelpProvider>,
    category: Option<String>,
    completer: Option<SharedCompleter>,
    flags: Arc<CommandFlags>,
}

impl CommandMetadata {
    pub(crate) fn from_info(id: CommandId, parent: Option<CommandId>, info: CommandInfo) -> Self {
        let flags = CommandFlags {
            hidden: AtomicBool::new(info.hidden),
            disabled: AtomicBool::new(info.disabled),
        };
        CommandMetadata {
            id,
            parent,
            parser: info.parser.map(|parser| parser.renamed(&info.name)),
            name: info.name,
            aliases: info.aliases,
            summary: info.summary,
            handler: info.handler,
            doc: info.doc,
            help_provider: info.help_provider,
            category: info.category,
            completer: info.completer,
            flags: Arc::new(flags),
        }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    /// The command this one is a sub-command of
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether `name` is this command's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// `None` for commands that take their tokens verbatim
    pub fn parser(&self) -> Option<&Parser> {
        self.parser.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn help_provider(&self) -> Option<&HelpProvider> {
        self.help_provider.as_ref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn completer(&self) -> Option<&SharedCompleter> {
        self.completer.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.hidden.load(Ordering::Acquire)
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.disabled.load(Ordering::Acquire)
    }

    /// Hidden commands stay invocable but are left out of listings
    pub fn set_hidden(&self, hidden: bool) {
        self.flags.hidden.store(hidden, Ordering::Release);
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.flags.disabled.store(disabled, Ordering::Release);
    }

    /// Visible means neither hidden nor disabled
    pub fn is_visible(&self) -> bool {
        !self.is_hidden() && !self.is_disabled()
    }
}

impl fmt::Debug for CommandMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMetadata")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("handler", &self.handler)
            .field("parser", &self.parser.as_ref().map(Parser::name))
            .field("category", &self.category)
            .field("hidden", &self.is_hidden())
            .field("disabled", &self.is_disabled())
            .finish()
    }
}
