//! Command collection
//!
//! Commands are declared on a [`CommandSetBuilder`] and collected into an
//! immutable [`CommandSet`] in one step. Collection either succeeds for every
//! declaration or fails as a whole.

use crate::config::ShellConfig;
use crate::error::{DispatchError, DispatchResult, RegistrationError, RegistrationResult, Result};
use crate::parser::{ParserCompleter, ParserNode, SharedCompleter};
use crate::registry::command::validate_name;
use crate::registry::{Command, CommandId, CommandInfoSource, CommandMetadata, FunctionDecl, Handler};
use crate::runner;
use crate::signature::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How a declared command produces its metadata
#[derive(Clone)]
pub enum Declaration {
    /// A plain function; metadata is derived from its identifier and doc string
    Function(FunctionDecl),
    /// A value that supplies its own metadata
    Described(Arc<dyn CommandInfoSource>),
}

struct Slot {
    parent: Option<CommandId>,
    /// Known up front for sub-commands, which are always explicitly named
    name: Option<String>,
    aliases: Vec<String>,
    summary: Option<String>,
    declaration: Declaration,
}

impl Slot {
    fn answers_to(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name) || self.aliases.iter().any(|alias| alias == name)
    }
}

/// Collects command declarations for one owner
pub struct CommandSetBuilder {
    config: ShellConfig,
    slots: Vec<Slot>,
}

impl CommandSetBuilder {
    pub fn new(config: ShellConfig) -> Self {
        CommandSetBuilder {
            config,
            slots: Vec::new(),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Declare a top-level command
    pub fn declare(&mut self, command: Command) -> CommandId {
        self.push(None, None, Declaration::Described(Arc::new(command)))
    }

    /// Declare a top-level command whose metadata comes from `source`
    pub fn declare_source(&mut self, source: Arc<dyn CommandInfoSource>) -> CommandId {
        self.push(None, None, Declaration::Described(source))
    }

    /// Declare a plain function that receives its tokens verbatim
    pub fn function<F>(&mut self, ident: &str, doc: Option<&str>, f: F) -> CommandId
    where
        F: Fn(&crate::registry::Call) -> crate::registry::HandlerResult + Send + Sync + 'static,
    {
        let decl = FunctionDecl::new(ident, doc, Handler::sync(f));
        self.push(None, None, Declaration::Function(decl))
    }

    /// Attach a named sub-command beneath `parent`
    ///
    /// The returned decorator is applied to the child's declaration.
    pub fn add_subcommand(&mut self, parent: CommandId, name: &str) -> RegistrationResult<SubcommandDecorator<'_>> {
        if parent.index() >= self.slots.len() {
            return Err(RegistrationError::UnknownParent(parent.index()));
        }
        Ok(SubcommandDecorator {
            builder: self,
            parent,
            name: name.to_string(),
            aliases: Vec::new(),
            summary: None,
        })
    }

    fn push(&mut self, parent: Option<CommandId>, name: Option<String>, declaration: Declaration) -> CommandId {
        self.push_slot(Slot {
            parent,
            name,
            aliases: Vec::new(),
            summary: None,
            declaration,
        })
    }

    fn push_slot(&mut self, slot: Slot) -> CommandId {
        let id = CommandId::new(self.slots.len());
        self.slots.push(slot);
        id
    }

    /// Collect every declaration into a command set
    pub fn build(self) -> Result<CommandSet> {
        let CommandSetBuilder { config, slots } = self;
        let mut arena: Vec<CommandMetadata> = Vec::with_capacity(slots.len());
        let mut top_level = BTreeMap::new();

        for (index, slot) in slots.into_iter().enumerate() {
            let id = CommandId::new(index);
            let mut info = match slot.declaration {
                Declaration::Function(decl) => decl.into_info(&config)?,
                Declaration::Described(source) => source.command_info(&config)?,
            };
            info.aliases.extend(slot.aliases);
            if slot.summary.is_some() {
                info.summary = slot.summary;
            }

            match slot.parent {
                Some(parent) => {
                    let parent_meta = arena
                        .get(parent.index())
                        .ok_or(RegistrationError::UnknownParent(parent.index()))?;
                    if parent_meta.parser().is_none() {
                        return Err(RegistrationError::NotComposable(parent_meta.name().to_string()).into());
                    }
                    if info.parser.is_none() {
                        return Err(RegistrationError::NotComposable(info.name.clone()).into());
                    }
                    let clash = std::iter::once(&info.name)
                        .chain(&info.aliases)
                        .find(|name| {
                            arena
                                .iter()
                                .any(|meta| meta.parent() == Some(parent) && meta.answers_to(name))
                        });
                    if let Some(name) = clash {
                        return Err(RegistrationError::DuplicateName {
                            name: name.clone(),
                            parent: Some(parent_meta.name().to_string()),
                        }
                        .into());
                    }
                    debug!(command = %info.name, parent = %parent_meta.name(), "attached sub-command");
                }
                None => {
                    if top_level.contains_key(&info.name) {
                        return Err(RegistrationError::DuplicateName {
                            name: info.name,
                            parent: None,
                        }
                        .into());
                    }
                    top_level.insert(info.name.clone(), id);
                    debug!(command = %info.name, "collected command");
                }
            }

            arena.push(CommandMetadata::from_info(id, slot.parent, info));
        }

        Ok(CommandSet {
            inner: Arc::new(Registry {
                config,
                arena,
                top_level,
            }),
        })
    }
}

/// Applies a sub-command declaration beneath its parent
pub struct SubcommandDecorator<'a> {
    builder: &'a mut CommandSetBuilder,
    parent: CommandId,
    name: String,
    aliases: Vec<String>,
    summary: Option<String>,
}

impl SubcommandDecorator<'_> {
    /// Another name the sub-command answers to
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// One-line help listed under the parent's sub-commands
    pub fn help(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn decorate(self, command: Command) -> RegistrationResult<CommandId> {
        let SubcommandDecorator {
            builder,
            parent,
            name,
            aliases,
            summary,
        } = self;

        let clash = std::iter::once(&name).chain(&aliases).find(|candidate| {
            builder
                .slots
                .iter()
                .any(|slot| slot.parent == Some(parent) && slot.answers_to(candidate))
        });
        if let Some(taken) = clash {
            let parent_name = builder.slots[parent.index()]
                .name
                .clone()
                .unwrap_or_else(|| parent.to_string());
            return Err(RegistrationError::DuplicateName {
                name: taken.clone(),
                parent: Some(parent_name),
            });
        }
        for alias in &aliases {
            validate_name(alias)?;
        }

        let command = command.name(name.clone());
        Ok(builder.push_slot(Slot {
            parent: Some(parent),
            name: Some(name),
            aliases,
            summary,
            declaration: Declaration::Described(Arc::new(command)),
        }))
    }
}

struct Registry {
    config: ShellConfig,
    arena: Vec<CommandMetadata>,
    top_level: BTreeMap<String, CommandId>,
}

/// An immutable, collected set of commands
///
/// Cloning is cheap; clones share the same records, including the runtime
/// hidden/disabled flags.
#[derive(Clone)]
pub struct CommandSet {
    inner: Arc<Registry>,
}

impl CommandSet {
    pub fn builder(config: ShellConfig) -> CommandSetBuilder {
        CommandSetBuilder::new(config)
    }

    /// Assemble a set from prebuilt records, bypassing collection checks
    #[cfg(test)]
    pub(crate) fn from_parts(config: ShellConfig, arena: Vec<CommandMetadata>) -> Self {
        let top_level = arena
            .iter()
            .filter(|meta| meta.parent().is_none())
            .map(|meta| (meta.name().to_string(), meta.id()))
            .collect();
        CommandSet {
            inner: Arc::new(Registry {
                config,
                arena,
                top_level,
            }),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    pub fn metadata(&self, id: CommandId) -> Option<&CommandMetadata> {
        self.inner.arena.get(id.index())
    }

    /// Look up a top-level command by name
    pub fn get_command_info(&self, name: &str) -> Option<&CommandMetadata> {
        self.inner
            .top_level
            .get(name)
            .and_then(|id| self.metadata(*id))
    }

    /// Top-level commands ordered by name
    ///
    /// Without `include_hidden`, hidden and disabled commands are left out.
    pub fn list_commands(&self, include_hidden: bool) -> Vec<&CommandMetadata> {
        self.inner
            .top_level
            .values()
            .filter_map(|id| self.metadata(*id))
            .filter(|meta| include_hidden || meta.is_visible())
            .collect()
    }

    /// Names of every top-level command
    pub fn get_all_commands(&self) -> Vec<&str> {
        self.inner.top_level.keys().map(String::as_str).collect()
    }

    /// Names of top-level commands that are neither hidden nor disabled
    pub fn get_visible_commands(&self) -> Vec<&str> {
        self.list_commands(false)
            .into_iter()
            .map(CommandMetadata::name)
            .collect()
    }

    /// Direct sub-commands of `id`, in declaration order
    pub fn children(&self, id: CommandId) -> Vec<&CommandMetadata> {
        self.inner
            .arena
            .iter()
            .filter(|meta| meta.parent() == Some(id))
            .collect()
    }

    pub fn parent(&self, id: CommandId) -> Option<&CommandMetadata> {
        self.metadata(id)
            .and_then(CommandMetadata::parent)
            .and_then(|parent| self.metadata(parent))
    }

    /// Find a command by its name path from the top level, e.g. `["server", "db"]`
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandMetadata> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get_command_info(first.as_ref())?;
        for name in rest {
            current = self
                .children(current.id())
                .into_iter()
                .find(|child| child.answers_to(name.as_ref()))?;
        }
        Some(current)
    }

    /// Names from the top-level ancestor down to `id`
    pub fn command_path(&self, id: CommandId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.metadata(id);
        while let Some(meta) = current {
            path.push(meta.name().to_string());
            // Guards against a malformed arena looping forever
            if path.len() > self.inner.arena.len() {
                break;
            }
            current = meta.parent().and_then(|parent| self.metadata(parent));
        }
        path.reverse();
        path
    }

    /// Compose the parser tree rooted at `id` from the current records
    ///
    /// `None` when the command takes its tokens verbatim.
    pub fn parser_tree(&self, id: CommandId) -> Option<ParserNode> {
        self.parser_tree_at(id, 0)
    }

    fn parser_tree_at(&self, id: CommandId, depth: usize) -> Option<ParserNode> {
        let meta = self.metadata(id)?;
        let parser = meta.parser()?.clone();
        let mut node = ParserNode::new(id, meta.name(), parser)
            .hidden(meta.is_hidden())
            .aliases(meta.aliases().to_vec())
            .summary(meta.summary().map(str::to_string));
        if depth > self.inner.arena.len() {
            return Some(node);
        }
        for child in self.children(id) {
            if let Some(child_node) = self.parser_tree_at(child.id(), depth + 1) {
                node = node.child(child_node);
            }
        }
        Some(node)
    }

    /// Help text for a command: its parser help (or doc string) and its category
    pub fn render_help(&self, meta: &CommandMetadata) -> String {
        let body = if let Some(provider) = meta.help_provider() {
            provider(true)
        } else if let Some(tree) = self.parser_tree(meta.id()) {
            let bin_name = self.command_path(meta.id()).join(" ");
            tree.to_command().bin_name(bin_name).render_help().to_string()
        } else if let Some(doc) = meta.doc() {
            doc.to_string()
        } else {
            self.config().nohelp.replace("{}", meta.name())
        };

        let mut text = body.trim_end().to_string();
        if let Some(category) = meta.category() {
            text.push_str(&format!("\n\nCategory: {}", category));
        }
        text
    }

    /// Resolve a top-level command for invocation by name
    pub fn resolve(&self, name: &str) -> DispatchResult<CommandId> {
        let meta = self
            .get_command_info(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;
        if meta.is_disabled() {
            return Err(DispatchError::CommandDisabled(name.to_string()));
        }
        Ok(meta.id())
    }

    /// Parse `argv` with the tree rooted at `root` and run the matched chain
    ///
    /// Async handlers are driven by `futures::executor::block_on`, outside any
    /// tokio runtime. Handlers awaiting tokio timers or I/O must be run through
    /// [`CommandSet::dispatch_async`].
    pub fn dispatch<I, S>(&self, root: CommandId, argv: I) -> DispatchResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        runner::dispatch(self, root, &argv)
    }

    /// Like [`CommandSet::dispatch`], awaiting asynchronous handlers in order
    pub async fn dispatch_async<I, S>(&self, root: CommandId, argv: I) -> DispatchResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        runner::dispatch_async(self, root, &argv).await
    }

    /// Dispatch a full token list whose first token names a top-level command
    ///
    /// Shares the async caveat of [`CommandSet::dispatch`].
    pub fn run<S: AsRef<str>>(&self, argv: &[S]) -> DispatchResult<Value> {
        let (name, rest) = split_command(argv)?;
        let root = self.resolve(&name)?;
        runner::dispatch(self, root, &rest)
    }

    pub async fn run_async<S: AsRef<str>>(&self, argv: &[S]) -> DispatchResult<Value> {
        let (name, rest) = split_command(argv)?;
        let root = self.resolve(&name)?;
        runner::dispatch_async(self, root, &rest).await
    }

    /// Completion candidates for the tokens following the command `id`
    pub fn completer_for(&self, id: CommandId) -> Option<SharedCompleter> {
        let meta = self.metadata(id)?;
        if let Some(completer) = meta.completer() {
            return Some(completer.clone());
        }
        let tree = self.parser_tree(id)?;
        Some(Arc::new(ParserCompleter::new(tree.to_command())))
    }

    /// A clap command describing every visible top-level command tree
    pub fn to_clap(&self, bin_name: &str) -> clap::Command {
        let mut command = clap::Command::new(bin_name.to_string())
            .subcommand_required(false)
            .disable_help_subcommand(true);
        for meta in self.list_commands(false) {
            let sub = match self.parser_tree(meta.id()) {
                Some(tree) => tree.to_command(),
                None => clap::Command::new(meta.name().to_string()).arg(
                    clap::Arg::new("args")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                ),
            };
            let sub = match meta.doc() {
                Some(doc) if sub.get_about().is_none() => sub.about(doc.to_string()),
                _ => sub,
            };
            command = command.subcommand(sub);
        }
        command
    }

    /// Shell completion script for the whole command tree
    pub fn completion_script(&self, shell: clap_complete::Shell, bin_name: &str) -> String {
        let mut command = self.to_clap(bin_name);
        let mut buffer = Vec::new();
        clap_complete::generate(shell, &mut command, bin_name.to_string(), &mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

fn split_command<S: AsRef<str>>(argv: &[S]) -> DispatchResult<(String, Vec<String>)> {
    let (first, rest) = argv
        .split_first()
        .ok_or_else(|| DispatchError::UnknownCommand(String::new()))?;
    let rest = rest.iter().map(|token| token.as_ref().to_string()).collect();
    Ok((first.as_ref().to_string(), rest))
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSet")
            .field("commands", &self.inner.arena)
            .finish()
    }
}
