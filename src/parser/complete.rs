//! Completion candidates derived from parsers

use std::collections::BTreeSet;
use std::sync::Arc;

/// Supplies completion candidates for a command's arguments
///
/// `tokens` are the tokens after the command name; the last one is the
/// (possibly empty) token being completed.
pub trait Completer: Send + Sync {
    fn complete(&self, tokens: &[String]) -> Vec<String>;
}

impl<F> Completer for F
where
    F: Fn(&[String]) -> Vec<String> + Send + Sync,
{
    fn complete(&self, tokens: &[String]) -> Vec<String> {
        self(tokens)
    }
}

/// Shared handle to a completer
pub type SharedCompleter = Arc<dyn Completer>;

/// Completes sub-command names, flags and choices from a composed clap command
#[derive(Debug, Clone)]
pub struct ParserCompleter {
    command: clap::Command,
}

impl ParserCompleter {
    pub fn new(command: clap::Command) -> Self {
        ParserCompleter { command }
    }
}

impl Completer for ParserCompleter {
    fn complete(&self, tokens: &[String]) -> Vec<String> {
        let (partial, done) = match tokens.split_last() {
            Some((last, rest)) => (last.as_str(), rest),
            None => ("", tokens),
        };

        let mut command = &self.command;
        let mut expecting: Option<&clap::Arg> = None;
        let mut positional = 0usize;
        let mut flags_done = false;

        for token in done {
            if expecting.take().is_some() {
                continue;
            }
            if token == "--" {
                flags_done = true;
                continue;
            }
            if token.starts_with('-') && !flags_done {
                if let Some(arg) = find_flag(command, token) {
                    if arg.get_action().takes_values() && !token.contains('=') {
                        expecting = Some(arg);
                    }
                }
                continue;
            }
            if let Some(sub) = command.find_subcommand(token) {
                command = sub;
                positional = 0;
                flags_done = false;
                continue;
            }
            positional += 1;
        }

        let mut candidates = BTreeSet::new();
        if let Some(arg) = expecting {
            candidates.extend(choices(arg));
        } else if partial.starts_with('-') && !flags_done {
            for arg in command.get_arguments().filter(|a| !a.is_hide_set()) {
                if let Some(long) = arg.get_long() {
                    candidates.insert(format!("--{}", long));
                }
                if let Some(short) = arg.get_short() {
                    candidates.insert(format!("-{}", short));
                }
            }
        } else {
            if positional == 0 {
                for sub in command.get_subcommands().filter(|sub| !sub.is_hide_set()) {
                    candidates.insert(sub.get_name().to_string());
                    candidates.extend(sub.get_visible_aliases().map(str::to_string));
                }
            }
            if let Some(arg) = command.get_positionals().nth(positional) {
                candidates.extend(choices(arg));
            }
        }

        candidates
            .into_iter()
            .filter(|candidate| candidate.starts_with(partial))
            .collect()
    }
}

fn find_flag<'a>(command: &'a clap::Command, token: &str) -> Option<&'a clap::Arg> {
    let token = token.split('=').next().unwrap_or(token);
    if let Some(long) = token.strip_prefix("--") {
        return command.get_arguments().find(|arg| {
            arg.get_long() == Some(long)
                || arg
                    .get_all_aliases()
                    .map_or(false, |aliases| aliases.contains(&long))
        });
    }
    let short = token.strip_prefix('-')?.chars().next()?;
    command
        .get_arguments()
        .find(|arg| arg.get_short() == Some(short))
}

fn choices(arg: &clap::Arg) -> Vec<String> {
    arg.get_possible_values()
        .iter()
        .filter(|value| !value.is_hide_set())
        .map(|value| value.get_name().to_string())
        .collect()
}
