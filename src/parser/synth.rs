//! Parser synthesis
//!
//! Builds clap parsers from argument specifications, and reads parsed
//! values back out of clap's matches.

use crate::error::{ParseError, ParseErrorKind};
use crate::parser::Namespace;
use crate::signature::{ArgKind, ArgumentSpec, Value, ValueType};
use clap::builder::{BoolishValueParser, PossibleValue, TypedValueParser};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice};
use std::ffi::OsStr;

/// A parser for one command level
///
/// Either synthesized from argument specifications or supplied by hand.
#[derive(Debug, Clone)]
pub struct Parser {
    command: clap::Command,
    /// `None` for manually supplied parsers
    specs: Option<Vec<ArgumentSpec>>,
}

/// Synthesize a parser whose arguments mirror `specs` one to one
pub fn synthesize(name: &str, specs: Vec<ArgumentSpec>, description: Option<&str>) -> Parser {
    let mut command = clap::Command::new(name.to_string()).color(ColorChoice::Never);

    if let Some(description) = description {
        command = command.about(description.to_string());
    }

    // A handler parameter may claim the help switch for itself
    let claims_help = specs.iter().any(|spec| {
        spec.identifier == "help" || spec.flags.iter().any(|f| f == "-h" || f == "--help")
    });
    if claims_help {
        command = command.disable_help_flag(true);
    }

    for spec in &specs {
        command = command.arg(build_arg(spec));
    }

    Parser {
        command,
        specs: Some(specs),
    }
}

impl Parser {
    /// Wrap a hand-built clap command; no synthesis happens for it
    pub fn manual(command: clap::Command) -> Self {
        Parser {
            command: command.color(ColorChoice::Never),
            specs: None,
        }
    }

    /// Rename the parser, as shown in usage lines
    pub fn renamed(mut self, name: &str) -> Self {
        if self.command.get_name() != name {
            self.command = self.command.name(name.to_string());
        }
        self
    }

    pub fn name(&self) -> &str {
        self.command.get_name()
    }

    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    /// Argument specifications, when the parser was synthesized
    pub fn specs(&self) -> Option<&[ArgumentSpec]> {
        self.specs.as_deref()
    }

    pub fn is_synthesized(&self) -> bool {
        self.specs.is_some()
    }

    pub fn description(&self) -> Option<String> {
        self.command.get_about().map(|about| about.to_string())
    }

    pub fn usage(&self) -> String {
        self.command.clone().render_usage().to_string()
    }

    pub fn help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Copy this level's values from `matches` into `namespace`
    pub(crate) fn extract(&self, matches: &ArgMatches, namespace: &mut Namespace) -> Result<(), ParseError> {
        match &self.specs {
            Some(specs) => {
                for spec in specs {
                    let value = self.extract_spec(spec, matches)?;
                    namespace.insert(spec.identifier.clone(), value);
                }
            }
            None => self.extract_manual(matches, namespace)?,
        }
        Ok(())
    }

    fn extract_spec(&self, spec: &ArgumentSpec, matches: &ArgMatches) -> Result<Value, ParseError> {
        let id = spec.identifier.as_str();
        let found = if spec.kind == ArgKind::BoolFlag {
            matches
                .try_get_one::<bool>(id)
                .map(|v| v.copied().map(Value::Bool))
        } else if spec.choices.is_some() {
            matches.try_get_one::<Value>(id).map(|v| v.cloned())
        } else {
            match spec.value_type {
                ValueType::Str => matches
                    .try_get_one::<String>(id)
                    .map(|v| v.cloned().map(Value::Str)),
                ValueType::Int => matches
                    .try_get_one::<i64>(id)
                    .map(|v| v.copied().map(Value::Int)),
                ValueType::Float => matches
                    .try_get_one::<f64>(id)
                    .map(|v| v.copied().map(Value::Float)),
                ValueType::Bool => matches
                    .try_get_one::<bool>(id)
                    .map(|v| v.copied().map(Value::Bool)),
            }
        };

        let found = found.map_err(|err| self.internal_error(id, &err))?;
        Ok(found.unwrap_or_else(|| spec.absent_value()))
    }

    /// Manual parsers carry no specs; values come back as raw strings
    fn extract_manual(&self, matches: &ArgMatches, namespace: &mut Namespace) -> Result<(), ParseError> {
        for arg in self.command.get_arguments() {
            let id = arg.get_id().as_str();
            let found = match arg.get_action() {
                ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version => {
                    continue
                }
                ArgAction::SetTrue | ArgAction::SetFalse => matches
                    .try_get_one::<bool>(id)
                    .map(|v| v.copied().map(Value::Bool)),
                ArgAction::Count => matches
                    .try_get_one::<u8>(id)
                    .map(|v| v.map(|n| Value::Int(i64::from(*n)))),
                _ => matches.try_get_raw(id).map(|raw| {
                    raw.map(|values| {
                        let mut items: Vec<Value> = values
                            .map(|v| Value::Str(v.to_string_lossy().into_owned()))
                            .collect();
                        if items.len() == 1 {
                            items.remove(0)
                        } else {
                            Value::List(items)
                        }
                    })
                }),
            };
            let found = found.map_err(|err| self.internal_error(id, &err))?;
            namespace.insert(id.to_string(), found.unwrap_or_default());
        }
        Ok(())
    }

    fn internal_error(&self, id: &str, err: &dyn std::fmt::Display) -> ParseError {
        ParseError::new(
            ParseErrorKind::Other,
            None,
            format!("cannot read argument '{}': {}", id, err),
            self.usage(),
        )
    }
}

/// Build the clap argument for one specification
fn build_arg(spec: &ArgumentSpec) -> Arg {
    let mut arg = Arg::new(spec.identifier.clone());
    if let Some(help) = &spec.help_text {
        arg = arg.help(help.clone());
    }

    match spec.kind {
        ArgKind::Positional => {
            arg = arg
                .action(ArgAction::Set)
                .required(spec.required)
                .value_name(spec.value_name());
            apply_value_parser(arg, spec)
        }
        ArgKind::Optional => {
            arg = apply_flags(arg, &spec.flags)
                .action(ArgAction::Set)
                .required(spec.required)
                .value_name(spec.value_name());
            apply_value_parser(arg, spec)
        }
        ArgKind::BoolFlag => {
            let action = match spec.default {
                Some(Value::Bool(true)) => ArgAction::SetFalse,
                _ => ArgAction::SetTrue,
            };
            apply_flags(arg, &spec.flags).action(action)
        }
    }
}

/// First short and first long become primary; the rest become visible aliases
fn apply_flags(mut arg: Arg, flags: &[String]) -> Arg {
    let mut has_long = false;
    let mut has_short = false;

    for flag in flags {
        if let Some(long) = flag.strip_prefix("--") {
            arg = if has_long {
                arg.visible_alias(long.to_string())
            } else {
                arg.long(long.to_string())
            };
            has_long = true;
        } else if let Some(short) = flag.strip_prefix('-').and_then(|s| s.chars().next()) {
            arg = if has_short {
                arg.visible_short_alias(short)
            } else {
                arg.short(short)
            };
            has_short = true;
        }
    }

    arg
}

fn apply_value_parser(arg: Arg, spec: &ArgumentSpec) -> Arg {
    if let Some(choices) = &spec.choices {
        let numeric = matches!(spec.value_type, ValueType::Int | ValueType::Float);
        return arg
            .value_parser(LiteralValueParser {
                value_type: spec.value_type,
                members: choices.clone(),
            })
            .allow_negative_numbers(numeric);
    }

    match spec.value_type {
        ValueType::Str => arg.value_parser(value_parser!(String)),
        ValueType::Int => arg
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true),
        ValueType::Float => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true),
        ValueType::Bool => arg.value_parser(BoolishValueParser::new()),
    }
}

/// Accepts exactly the members of a literal
///
/// The token is converted to the literal's value type first, so `1.0` and
/// `1` both select a float member `1.0`.
#[derive(Debug, Clone)]
struct LiteralValueParser {
    value_type: ValueType,
    members: Vec<Value>,
}

impl LiteralValueParser {
    fn coerce(&self, raw: &str) -> Option<Value> {
        match self.value_type {
            ValueType::Str => Some(Value::Str(raw.to_string())),
            ValueType::Int => raw.parse().ok().map(Value::Int),
            ValueType::Float => raw.parse().ok().map(Value::Float),
            ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "n" | "off" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

impl TypedValueParser for LiteralValueParser {
    type Value = Value;

    fn parse_ref(&self, cmd: &clap::Command, arg: Option<&Arg>, value: &OsStr) -> Result<Value, clap::Error> {
        let raw = value
            .to_str()
            .ok_or_else(|| clap::Error::new(ErrorKind::InvalidUtf8).with_cmd(cmd))?;

        self.coerce(raw)
            .and_then(|parsed| self.members.iter().find(|member| **member == parsed).cloned())
            .ok_or_else(|| {
                let mut err = clap::Error::new(ErrorKind::InvalidValue).with_cmd(cmd);
                if let Some(arg) = arg {
                    err.insert(ContextKind::InvalidArg, ContextValue::String(arg.to_string()));
                }
                err.insert(ContextKind::InvalidValue, ContextValue::String(raw.to_string()));
                let valid = self.members.iter().map(ToString::to_string).collect();
                err.insert(ContextKind::ValidValue, ContextValue::Strings(valid));
                err
            })
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            self.members.iter().map(|member| PossibleValue::new(member.to_string())),
        ))
    }
}

/// Translate a clap failure into a structured parse error
pub(crate) fn parse_error_from_clap(err: &clap::Error, fallback_usage: String) -> ParseError {
    let kind = match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            ParseErrorKind::HelpRequested
        }
        ErrorKind::UnknownArgument | ErrorKind::InvalidSubcommand => ParseErrorKind::UnknownArgument,
        ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand => {
            ParseErrorKind::MissingArgument
        }
        ErrorKind::InvalidValue => ParseErrorKind::InvalidChoice,
        ErrorKind::ValueValidation | ErrorKind::InvalidUtf8 => ParseErrorKind::InvalidValue,
        _ => ParseErrorKind::Other,
    };

    let usage = err
        .get(ContextKind::Usage)
        .map(ToString::to_string)
        .unwrap_or(fallback_usage);

    if kind == ParseErrorKind::HelpRequested {
        return ParseError::new(kind, None, err.to_string(), usage);
    }

    let token_context = match kind {
        ParseErrorKind::InvalidChoice | ParseErrorKind::InvalidValue => {
            [ContextKind::InvalidValue, ContextKind::InvalidArg]
        }
        _ => [ContextKind::InvalidSubcommand, ContextKind::InvalidArg],
    };
    let token = token_context
        .iter()
        .find_map(|context| err.get(*context))
        .map(ToString::to_string);

    // The body runs up to the usage line; tips and blank lines are dropped
    let rendered = err.to_string();
    let body: Vec<&str> = rendered
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with("tip:"))
        .collect();
    let message = if body.is_empty() {
        rendered.trim().to_string()
    } else {
        body.join(" ").trim_start_matches("error: ").to_string()
    };

    ParseError::new(kind, token, message, usage)
}
