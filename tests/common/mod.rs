//! Common test utilities

#![allow(dead_code)]

use cmdtree::config::ShellConfig;
use cmdtree::{Call, Command, CommandId, CommandSet, CommandSetBuilder, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory with a cmdtree.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cmdtree.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Records which handlers ran, in order
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// A command that records its name and returns it
    pub fn command(&self, ident: &str) -> Command {
        let recorder = self.clone();
        let label = ident.trim_start_matches("do_").to_string();
        Command::from_fn(ident, move |call: &Call| {
            recorder.record(label.clone());
            Ok(Value::from(call.name()))
        })
    }
}

/// `server` -> `db` -> `migrate(version)` with every handler recorded
pub struct ServerTree {
    pub commands: CommandSet,
    pub recorder: Recorder,
    pub server: CommandId,
    pub db: CommandId,
    pub migrate: CommandId,
}

pub fn server_tree() -> ServerTree {
    let recorder = Recorder::new();
    let mut builder = CommandSetBuilder::new(ShellConfig::default());
    let server = builder.declare(recorder.command("do_server"));
    let db = builder
        .add_subcommand(server, "db")
        .unwrap()
        .decorate(recorder.command("db"))
        .unwrap();

    let migrate_recorder = recorder.clone();
    let migrate = builder
        .add_subcommand(db, "migrate")
        .unwrap()
        .decorate(
            Command::from_fn("migrate", move |call| {
                let version = call.get_str("version").unwrap_or_default().to_string();
                migrate_recorder.record(format!("migrate {}", version));
                Ok(Value::from(format!("migrated to {}", version)))
            })
            .signature(cmdtree::Signature::new().positional("version", cmdtree::ParamType::Str)),
        )
        .unwrap();

    ServerTree {
        commands: builder.build().unwrap(),
        recorder,
        server,
        db,
        migrate,
    }
}
