//! Line-oriented front door and the `cmdtree` binary

use crate::cli::demo;
use crate::config::{load_config, validate_config, ShellConfig};
use crate::error::{is_recoverable, CmdTreeError, DispatchError, DispatchResult, ParseError, ParseErrorKind};
use crate::registry::{CommandId, CommandSet};
use crate::signature::Value;
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Default log filter for this level
    pub fn log_filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
        }
    }
}

/// A line split into its command and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// `None` for an empty line or a shortcut to an unknown command
    pub command: Option<String>,
    pub args: Vec<String>,
    /// The line after trimming and shortcut expansion
    pub line: String,
}

/// Runs one command line at a time against a command set
#[derive(Debug)]
pub struct Shell {
    commands: CommandSet,
    last_line: Option<String>,
}

impl Shell {
    pub fn new(commands: CommandSet) -> Self {
        Shell {
            commands,
            last_line: None,
        }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// The last non-empty line that named a command
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    /// Trim, expand shortcuts and split a line shell-style
    pub fn parse_line(&self, line: &str) -> DispatchResult<ParsedLine> {
        let mut line = line.trim().to_string();
        if line.is_empty() {
            return Ok(ParsedLine {
                command: None,
                args: Vec::new(),
                line,
            });
        }

        if let Some((prefix, command)) = self.commands.config().match_shortcut(&line) {
            if self.commands.get_command_info(command).is_none() {
                return Ok(ParsedLine {
                    command: None,
                    args: Vec::new(),
                    line,
                });
            }
            line = format!("{} {}", command, &line[prefix.len()..]);
        }

        let mut tokens = tokenize(&line)?.into_iter();
        Ok(ParsedLine {
            command: tokens.next(),
            args: tokens.collect(),
            line,
        })
    }

    /// Run one line; an empty line repeats the last command
    pub fn onecmd(&mut self, line: &str) -> DispatchResult<Value> {
        let (root, args) = match self.prepare_line(line)? {
            Some(prepared) => prepared,
            None => return Ok(Value::None),
        };
        self.commands.dispatch(root, args)
    }

    /// Like [`Shell::onecmd`], awaiting asynchronous handlers
    pub async fn onecmd_async(&mut self, line: &str) -> DispatchResult<Value> {
        let (root, args) = match self.prepare_line(line)? {
            Some(prepared) => prepared,
            None => return Ok(Value::None),
        };
        self.commands.dispatch_async(root, args).await
    }

    /// Run an already tokenized command line
    pub fn onecmd_argv<S: AsRef<str>>(&mut self, argv: &[S]) -> DispatchResult<Value> {
        self.commands.run(argv)
    }

    fn prepare_line(&mut self, line: &str) -> DispatchResult<Option<(CommandId, Vec<String>)>> {
        let parsed = self.parse_line(line)?;
        if parsed.line.is_empty() {
            return match self.last_line.clone() {
                Some(last) => {
                    debug!(line = %last, "repeating last command");
                    self.prepare_line(&last)
                }
                None => Ok(None),
            };
        }

        let command = parsed
            .command
            .ok_or_else(|| DispatchError::UnknownCommand(parsed.line.clone()))?;
        self.last_line = Some(line.trim().to_string());

        let root = self.commands.resolve(&command)?;
        Ok(Some((root, parsed.args)))
    }

    /// Completion candidates for a partially typed line
    pub fn complete(&self, line: &str) -> Vec<String> {
        let mut text = line.trim_start().to_string();
        if let Some((prefix, command)) = self.commands.config().match_shortcut(&text) {
            if self.commands.get_command_info(command).is_some() {
                text = format!("{} {}", command, &text[prefix.len()..]);
            }
        }

        let mut tokens = tokenize(&text).unwrap_or_else(|_| text.split_whitespace().map(str::to_string).collect());
        if text.is_empty() || text.ends_with(char::is_whitespace) {
            tokens.push(String::new());
        }

        match tokens.split_first() {
            Some((partial, [])) => self
                .commands
                .get_visible_commands()
                .into_iter()
                .filter(|name| name.starts_with(partial.as_str()))
                .map(str::to_string)
                .collect(),
            Some((command, rest)) => self
                .commands
                .get_command_info(command)
                .filter(|meta| meta.is_visible())
                .and_then(|meta| self.commands.completer_for(meta.id()))
                .map(|completer| completer.complete(rest))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

/// Whether a command result asks the loop to stop
pub fn is_stop(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn tokenize(line: &str) -> DispatchResult<Vec<String>> {
    shell_words::split(line).map_err(|err| {
        DispatchError::Parse(ParseError::new(
            ParseErrorKind::Other,
            None,
            format!("cannot split line: {}", err),
            String::new(),
        ))
    })
}

/// Shells a completion script can be generated for
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Elvish,
    Powershell,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
            CompletionShell::Elvish => clap_complete::Shell::Elvish,
            CompletionShell::Powershell => clap_complete::Shell::PowerShell,
        }
    }
}

/// Command-line options of the `cmdtree` binary
#[derive(Debug, Parser)]
#[command(name = "cmdtree", version, about = "Hierarchical command dispatch demo")]
pub struct Cli {
    /// Path to cmdtree.yml config file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Only print results and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print no diagnostics
    #[arg(short, long, conflicts_with = "quiet")]
    pub silent: bool,

    /// Print verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a completion script for SHELL and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<CompletionShell>,

    /// Command line to run once; reads lines from stdin when omitted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.silent {
            Verbosity::Silent
        } else if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Install the stderr log subscriber; `CMDTREE_LOG` overrides the level
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env("CMDTREE_LOG").unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    // A subscriber may already be installed, e.g. by a host application
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), CmdTreeError> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let (config, config_path) = load_config(cli.file.as_deref())?;
    validate_config(&config)?;
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "configuration loaded");
    }

    let commands = demo::command_set(config)?;

    if let Some(shell) = cli.completions {
        let script = commands.completion_script(shell.into(), "cmdtree");
        print!("{}", script);
        return Ok(());
    }

    let mut shell = Shell::new(commands);
    if !cli.command.is_empty() {
        match shell.onecmd_argv(&cli.command) {
            Ok(value) => print_value(&value),
            Err(DispatchError::Parse(parse)) if parse.is_help() => report(&DispatchError::Parse(parse)),
            Err(err) => return Err(err.into()),
        }
        return Ok(());
    }

    run_lines(&mut shell, io::stdin().lock(), cli.verbosity())
}

/// Run each line from `input` until a command asks to stop
pub fn run_lines<R: BufRead>(shell: &mut Shell, input: R, verbosity: Verbosity) -> Result<(), CmdTreeError> {
    debug!(shell = %shell.commands().config().display_name(), "reading command lines");
    if verbosity >= Verbosity::Normal {
        if let Some(intro) = &shell.commands().config().intro {
            println!("{}", intro);
        }
    }

    for line in input.lines() {
        let line = line?;
        match shell.onecmd(&line) {
            Ok(value) if is_stop(&value) => break,
            Ok(value) => print_value(&value),
            Err(err) if is_recoverable(&err) || matches!(err, DispatchError::Execution { .. }) => {
                report(&err);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn print_value(value: &Value) {
    if !value.is_none() {
        println!("{}", value);
    }
}

fn report(err: &DispatchError) {
    match err {
        DispatchError::Parse(parse) if parse.is_help() => print!("{}", parse.message),
        DispatchError::Parse(parse) => {
            eprintln!("Error: {}", parse.message);
            if !parse.usage.is_empty() {
                eprintln!("{}", parse.usage.trim_end());
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

/// Build a shell over the default configuration
pub fn default_shell() -> Result<Shell, CmdTreeError> {
    Ok(Shell::new(demo::command_set(ShellConfig::default())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::parse_from(["cmdtree", "-q"]);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
        let cli = Cli::parse_from(["cmdtree", "add", "1", "2"]);
        assert_eq!(cli.verbosity(), Verbosity::Normal);
        assert_eq!(cli.command, vec!["add", "1", "2"]);
    }

    #[test]
    fn test_trailing_command_keeps_hyphen_values() {
        let cli = Cli::parse_from(["cmdtree", "-v", "add", "3", "4", "--verbose"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, vec!["add", "3", "4", "--verbose"]);
    }

    #[test]
    fn test_parse_line_expands_shortcuts() {
        let shell = default_shell().unwrap();
        let parsed = shell.parse_line("  ?add ").unwrap();
        assert_eq!(parsed.command.as_deref(), Some("help"));
        assert_eq!(parsed.args, vec!["add"]);
        assert_eq!(parsed.line, "help add");

        // `!` maps to an unregistered command
        let parsed = shell.parse_line("!ls").unwrap();
        assert_eq!(parsed.command, None);
        assert_eq!(parsed.line, "!ls");
    }

    #[test]
    fn test_parse_line_quotes() {
        let shell = default_shell().unwrap();
        let parsed = shell.parse_line("greet 'big world'").unwrap();
        assert_eq!(parsed.args, vec!["big world"]);
        assert!(shell.parse_line("greet 'open").is_err());
    }
}
