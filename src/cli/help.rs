//! Help rendering and built-in commands
//!
//! Output is plain text; styling belongs to whatever front-end prints it.

use crate::error::DispatchError;
use crate::registry::{Command, CommandMetadata, CommandSet, CommandSetBuilder};
use crate::signature::{Annotation, Param, ParamType, Signature, Value};
use std::collections::BTreeMap;

/// Help text for one command
///
/// The short form is a one-line summary; the verbose form is the full help.
pub fn format_help_text(commands: &CommandSet, meta: &CommandMetadata, verbose: bool) -> String {
    if let Some(provider) = meta.help_provider() {
        return provider(verbose);
    }
    if let Some(parser) = meta.parser() {
        if verbose {
            return commands.render_help(meta);
        }
        return match parser.description() {
            Some(description) => description,
            None => parser.usage().trim_end().to_string(),
        };
    }
    match meta.doc() {
        Some(doc) => doc.to_string(),
        None => commands.config().nohelp.replace("{}", meta.name()),
    }
}

/// Commands offering no help of any kind
fn is_undocumented(meta: &CommandMetadata) -> bool {
    meta.help_provider().is_none() && meta.parser().is_none() && meta.category().is_none() && meta.doc().is_none()
}

/// Visible commands grouped by category
pub fn help_topics(commands: &CommandSet) -> BTreeMap<String, Vec<&CommandMetadata>> {
    let mut topics: BTreeMap<String, Vec<&CommandMetadata>> = BTreeMap::new();
    for meta in commands.list_commands(false) {
        if let Some(category) = meta.category() {
            topics.entry(category.to_string()).or_default().push(meta);
        }
    }
    topics
}

/// One titled section of the help menu
pub fn format_help_menu(commands: &CommandSet, title: &str, entries: &[&CommandMetadata], verbose: bool) -> String {
    let mut entries = entries.to_vec();
    entries.sort_by(|a, b| a.name().cmp(b.name()));

    let mut out = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));
    if verbose {
        for meta in entries {
            let summary = format_help_text(commands, meta, false);
            let first_line = summary.lines().next().unwrap_or_default();
            out.push_str(&format!("{} - {}\n", meta.name(), first_line));
        }
    } else {
        let names: Vec<&str> = entries.iter().map(|meta| meta.name()).collect();
        out.push_str(&names.join("  "));
        out.push('\n');
    }
    out
}

/// The full help menu: categorized commands, then undocumented ones
pub fn help_menu(commands: &CommandSet, verbose: bool) -> String {
    let config = commands.config();
    let topics = help_topics(commands);
    let visible = commands.list_commands(false);
    let undocumented: Vec<&CommandMetadata> = visible.iter().copied().filter(|m| is_undocumented(m)).collect();

    let mut sections = Vec::new();
    if topics.is_empty() {
        sections.push(format_help_menu(commands, &config.doc_header, &visible, verbose));
    } else {
        sections.push(config.doc_header.clone());
        for (category, entries) in &topics {
            sections.push(format_help_menu(commands, category, entries, verbose));
        }
        let uncategorized: Vec<&CommandMetadata> = visible
            .iter()
            .copied()
            .filter(|m| m.category().is_none() && !is_undocumented(m))
            .collect();
        if !uncategorized.is_empty() {
            sections.push(format_help_menu(commands, &config.default_category, &uncategorized, verbose));
        }
    }
    if !undocumented.is_empty() {
        sections.push(format_help_menu(commands, &config.undoc_header, &undocumented, verbose));
    }

    sections.join("\n")
}

/// Help for a topic: the menu, a category listing, or one command
pub fn help_for_topic(commands: &CommandSet, topic: &str, verbose: bool) -> Result<String, DispatchError> {
    if topic.is_empty() {
        return Ok(help_menu(commands, verbose));
    }

    if let Some(meta) = commands.get_command_info(topic) {
        return Ok(format_help_text(commands, meta, verbose));
    }

    let topics = help_topics(commands);
    match topics.get(topic) {
        Some(entries) => Ok(format_help_menu(commands, topic, entries, verbose)),
        None => Err(DispatchError::UnknownCommand(topic.to_string())),
    }
}

/// Declare the built-in `help` and `exit` commands
pub fn register_builtins(builder: &mut CommandSetBuilder) {
    let signature = Signature::new()
        .param(Param::new("topic", ParamType::Str).default("").help("Command or category"))
        .keyword_only()
        .param(
            Param::new("verbose", ParamType::Bool)
                .default(false)
                .annotated(Annotation::new().flags(["-v", "--verbose"]).help("Show more detail")),
        );

    builder.declare(
        Command::from_fn("do_help", |call| {
            let topic = call.get_str("topic").unwrap_or_default();
            let text = help_for_topic(call.owner(), topic, call.flag("verbose"))?;
            Ok(Value::from(text))
        })
        .signature(signature)
        .doc("List available commands or provide detailed help for a specific command"),
    );

    builder.function("do_exit", Some("Exit the command loop"), |_| Ok(Value::Bool(true)));
}
