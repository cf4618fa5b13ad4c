//! Configuration file parsing and discovery

use crate::config::types::ShellConfig;
use crate::error::{CmdTreeError, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["cmdtree.yml", "cmdtree.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Per-user configuration file, e.g. `~/.config/cmdtree/cmdtree.yml`
pub fn user_config_file() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "cmdtree")?;
    let path = dirs.config_dir().join(CONFIG_FILE_NAMES[0]);
    path.is_file().then_some(path)
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<ShellConfig, CmdTreeError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e)))?;

    parse_config(&contents)
}

/// Parse configuration from a string; missing keys take their defaults
pub fn parse_config(yaml: &str) -> Result<ShellConfig, CmdTreeError> {
    if yaml.trim().is_empty() {
        return Ok(ShellConfig::default());
    }
    let config: ShellConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Load configuration: explicit path, then project discovery, then the user
/// file, then defaults
pub fn load_config(explicit: Option<&Path>) -> Result<(ShellConfig, Option<PathBuf>), CmdTreeError> {
    if let Some(path) = explicit {
        return Ok((parse_config_file(path)?, Some(path.to_path_buf())));
    }

    let found = find_config_file().ok().or_else(user_config_file);
    match found {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok((parse_config_file(&path)?, Some(path)))
        }
        None => {
            debug!("no configuration file found, using defaults");
            Ok((ShellConfig::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
name: ops
default-category: General
shortcuts:
  "?": help
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("ops"));
        assert_eq!(config.default_category, "General");
        assert_eq!(config.shortcuts.len(), 1);
        assert_eq!(config.command_prefix, "do_");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), ShellConfig::default());
    }

    #[test]
    fn test_unknown_shape_is_yaml_error() {
        let result = parse_config("shortcuts: [1, 2]");
        assert!(matches!(result, Err(CmdTreeError::Yaml(_))));
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cmdtree.yml");
        fs::write(&config_path, "name: test\n").unwrap();

        let found = find_config_file_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cmdtree.yaml");
        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();
        fs::write(&config_path, "name: test\n").unwrap();

        let found = find_config_file_from(sub_dir).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.yml");
        fs::write(&config_path, "nohelp: \"nothing for {}\"\n").unwrap();

        let (config, path) = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.nohelp, "nothing for {}");
        assert_eq!(path, Some(config_path));
    }
}
