//! Parse results

use crate::registry::CommandId;
use crate::signature::Value;
use std::collections::BTreeMap;

static NONE: Value = Value::None;

/// Values produced by one parse pass over a command tree
///
/// Every level of the tree writes its own values here, so a sub-command's
/// argument shadows a parent argument of the same name. The terminal marker
/// is overwritten by each matched level and ends up naming the deepest one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
    terminal: Option<CommandId>,
    path: Vec<String>,
    rest: Vec<String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace for a parser-less command: tokens are passed through verbatim
    pub fn raw(command: CommandId, name: &str, argv: &[String]) -> Self {
        let mut namespace = Namespace::new();
        namespace.mark_terminal(command, name);
        namespace.rest = argv.to_vec();
        namespace
    }

    /// The deepest matched command
    pub fn terminal(&self) -> Option<CommandId> {
        self.terminal
    }

    /// Record `command` as the deepest match so far, replacing any earlier marker
    pub(crate) fn mark_terminal(&mut self, command: CommandId, name: &str) {
        self.terminal = Some(command);
        self.path.push(name.to_string());
    }

    /// Names of the matched commands, root first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Unparsed tokens handed to raw commands
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Like [`Namespace::get`], with absent keys reading as [`Value::None`]
    pub fn value(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NONE)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.value(key).as_str()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.value(key).as_int()
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.value(key).as_float()
    }

    /// Boolean flags; absent or non-boolean reads as `false`
    pub fn flag(&self, key: &str) -> bool {
        self.value(key).as_bool().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_marker_is_overwritten() {
        let mut ns = Namespace::new();
        assert_eq!(ns.terminal(), None);

        ns.mark_terminal(CommandId::new(0), "server");
        ns.mark_terminal(CommandId::new(3), "db");
        assert_eq!(ns.terminal(), Some(CommandId::new(3)));
        assert_eq!(ns.path(), ["server", "db"]);
    }

    #[test]
    fn test_typed_accessors() {
        let mut ns = Namespace::new();
        ns.insert("x", Value::Float(3.0));
        ns.insert("name", Value::from("world"));
        ns.insert("verbose", Value::Bool(true));

        assert_eq!(ns.get_float("x"), Some(3.0));
        assert_eq!(ns.get_str("name"), Some("world"));
        assert!(ns.flag("verbose"));
        assert!(!ns.flag("missing"));
        assert_eq!(ns.value("missing"), &Value::None);
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn test_raw_namespace_keeps_tokens() {
        let argv = vec!["a".to_string(), "--b".to_string()];
        let ns = Namespace::raw(CommandId::new(1), "exit", &argv);
        assert_eq!(ns.rest(), argv.as_slice());
        assert_eq!(ns.terminal(), Some(CommandId::new(1)));
        assert!(ns.is_empty());
    }
}
