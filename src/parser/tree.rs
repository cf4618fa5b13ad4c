//! Composed parser trees
//!
//! A parser node pairs one command's parser with the nodes of its
//! sub-commands. Trees are assembled on demand from the registry and
//! parsed in a single pass.

use crate::error::ParseError;
use crate::parser::synth::parse_error_from_clap;
use crate::parser::{Namespace, Parser};
use crate::registry::CommandId;
use clap::ArgMatches;
use tracing::trace;

/// One level of a composed sub-command tree
#[derive(Debug, Clone)]
pub struct ParserNode {
    pub id: CommandId,
    pub name: String,
    pub aliases: Vec<String>,
    /// Listed next to this node in its parent's help
    pub summary: Option<String>,
    pub hidden: bool,
    pub parser: Parser,
    pub children: Vec<ParserNode>,
}

impl ParserNode {
    pub fn new(id: CommandId, name: &str, parser: Parser) -> Self {
        ParserNode {
            id,
            name: name.to_string(),
            aliases: Vec::new(),
            summary: None,
            hidden: false,
            parser: parser.renamed(name),
            children: Vec::new(),
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn child(mut self, child: ParserNode) -> Self {
        self.children.push(child);
        self
    }

    /// Look up a direct child by name or alias
    pub fn find_child(&self, name: &str) -> Option<&ParserNode> {
        self.children
            .iter()
            .find(|child| child.name == name || child.aliases.iter().any(|alias| alias == name))
    }

    /// Build the clap command for this node with every descendant attached
    pub fn to_command(&self) -> clap::Command {
        let mut command = self.parser.command().clone();
        if !self.children.is_empty() {
            command = command
                .subcommand_value_name("SUBCOMMAND")
                .disable_help_subcommand(true);
            for child in &self.children {
                let mut sub = child
                    .to_command()
                    .hide(child.hidden)
                    .visible_aliases(child.aliases.clone());
                if let Some(summary) = &child.summary {
                    sub = sub.about(summary.clone());
                }
                command = command.subcommand(sub);
            }
        }
        command
    }

    pub fn usage(&self) -> String {
        self.to_command().render_usage().to_string()
    }

    /// Full help for this level, sub-commands included
    pub fn help(&self) -> String {
        self.to_command().render_help().to_string()
    }

    /// Parse `argv` against the whole tree
    ///
    /// Each matched level writes its values and then marks itself terminal,
    /// so after the walk the marker holds the deepest matched command.
    pub fn parse(&self, argv: &[String]) -> Result<Namespace, ParseError> {
        let mut command = self.to_command().no_binary_name(true);
        let matches = match command.try_get_matches_from_mut(argv.iter().cloned()) {
            Ok(matches) => matches,
            Err(err) => {
                let usage = command.render_usage().to_string();
                return Err(parse_error_from_clap(&err, usage));
            }
        };

        let mut namespace = Namespace::new();
        let mut node = self;
        let mut level: &ArgMatches = &matches;
        loop {
            node.parser.extract(level, &mut namespace)?;
            namespace.mark_terminal(node.id, &node.name);
            trace!(command = %node.name, "matched parser level");

            let Some((name, sub_matches)) = level.subcommand() else {
                break;
            };
            match node.find_child(name) {
                Some(child) => {
                    node = child;
                    level = sub_matches;
                }
                // A manual parser may declare clap sub-commands of its own
                None => break,
            }
        }

        Ok(namespace)
    }
}
