//! Commands served by the `cmdtree` binary

use crate::cli::help::register_builtins;
use crate::config::ShellConfig;
use crate::error::Result;
use crate::registry::{Command, CommandSet};
use crate::signature::{Annotation, Param, ParamType, Signature, Value};
use anyhow::Context as _;
use tracing::info;

/// The demo command set: arithmetic, a greeting and a three-level server tree
pub fn command_set(config: ShellConfig) -> Result<CommandSet> {
    let mut builder = CommandSet::builder(config);
    register_builtins(&mut builder);

    builder.declare(
        Command::from_fn("do_add", |call| {
            let x = call.get_float("x").context("missing x")?;
            let y = call.get_float("y").context("missing y")?;
            if call.flag("verbose") {
                info!(x, y, "adding");
            }
            Ok(Value::Float(x + y))
        })
        .signature(
            Signature::new()
                .param(Param::new("x", ParamType::Float).help("First operand"))
                .param(Param::new("y", ParamType::Float).help("Second operand"))
                .keyword("verbose", ParamType::Bool, false),
        )
        .doc("Add two numbers")
        .category("Math"),
    );

    builder.declare(
        Command::from_fn("do_greet", |call| {
            let name = call.get_str("name").unwrap_or("world");
            let greeting = call.get_str("greeting").unwrap_or("hello");
            Ok(Value::from(format!("{}, {}!", greeting, name)))
        })
        .signature(
            Signature::new()
                .param(Param::new("name", ParamType::Str).default("world"))
                .keyword_only()
                .param(
                    Param::new("greeting", ParamType::literal(["hello", "hi", "hey"]))
                        .default("hello")
                        .annotated(Annotation::new().flags(["-g", "--greeting"])),
                ),
        )
        .doc("Greet someone"),
    );

    let server = builder.declare(
        Command::from_fn("do_server", |call| {
            Ok(Value::from(format!("server:{}", call.get_int("port").unwrap_or(8080))))
        })
        .signature(Signature::new().keyword("port", ParamType::Int, 8080i64))
        .doc("Manage the server")
        .category("Ops"),
    );

    let db = builder.add_subcommand(server, "db")?.alias("database").decorate(
        Command::from_fn("db", |call| Ok(Value::from(format!("{}/db", call.previous())))).doc("Database tasks"),
    )?;

    builder.add_subcommand(db, "migrate")?.decorate(
        Command::from_fn("migrate", |call| {
            let version = call.get_str("version").context("missing version")?;
            let mode = if call.flag("dry_run") { "would migrate" } else { "migrated" };
            Ok(Value::from(format!("{}: {} to {}", call.previous(), mode, version)))
        })
        .signature(
            Signature::new()
                .positional("version", ParamType::Str)
                .keyword("dry_run", ParamType::Bool, false),
        )
        .doc("Apply schema migrations"),
    )?;

    builder.function("do_echo", Some("Print the arguments back"), |call| {
        Ok(Value::from(call.argv().join(" ")))
    });

    builder.build()
}
