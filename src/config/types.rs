//! Shell configuration types
//!
//! This module defines the data structures that represent a cmdtree.yml file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings shared by every command set and shell
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShellConfig {
    /// Application name (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Banner printed before the first command (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,

    /// Line prefixes expanded to command names, e.g. `?` -> `help`
    pub shortcuts: BTreeMap<String, String>,

    /// Heading for commands without a category
    pub default_category: String,

    /// Heading for the help menu
    pub doc_header: String,

    /// Heading for commands with no help at all
    pub undoc_header: String,

    /// Message for a command without help; `{}` is replaced by its name
    pub nohelp: String,

    /// Prefix stripped from function identifiers to form command names
    pub command_prefix: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let shortcuts = [("?", "help"), ("!", "shell"), ("@", "run_script")]
            .into_iter()
            .map(|(prefix, command)| (prefix.to_string(), command.to_string()))
            .collect();

        ShellConfig {
            name: None,
            intro: None,
            shortcuts,
            default_category: "Uncategorized".to_string(),
            doc_header: "Documented commands (type help <topic>):".to_string(),
            undoc_header: "Undocumented commands:".to_string(),
            nohelp: "No help on {}".to_string(),
            command_prefix: "do_".to_string(),
        }
    }
}

impl ShellConfig {
    /// Display name, falling back to the crate name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("cmdtree")
    }

    /// The shortcut matching the start of `line`, longest prefix first
    pub fn match_shortcut<'a>(&'a self, line: &str) -> Option<(&'a str, &'a str)> {
        self.shortcuts
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, command)| (prefix.as_str(), command.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.default_category, "Uncategorized");
        assert_eq!(config.command_prefix, "do_");
        assert_eq!(config.shortcuts.get("?").map(String::as_str), Some("help"));
        assert_eq!(config.display_name(), "cmdtree");
    }

    #[test]
    fn test_longest_shortcut_wins() {
        let mut config = ShellConfig::default();
        config.shortcuts.insert("??".to_string(), "manual".to_string());
        assert_eq!(config.match_shortcut("?? x"), Some(("??", "manual")));
        assert_eq!(config.match_shortcut("? x"), Some(("?", "help")));
        assert_eq!(config.match_shortcut("help"), None);
    }
}
