//! Command chains
//!
//! A chain is the root-to-leaf sequence of commands matched by one parse.
//! It is rebuilt after every parse by following parent links upward from the
//! terminal command, and dropped once dispatch finishes.

use crate::error::{DispatchError, DispatchResult};
use crate::registry::{CommandId, CommandMetadata, CommandSet};

/// One link of a resolved chain
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub metadata: CommandMetadata,
    /// Index of the parent link; `None` for the root
    pub parent: Option<usize>,
}

/// The ordered links from the dispatch root down to the terminal command
#[derive(Debug, Clone)]
pub struct Chain {
    links: Vec<ChainLink>,
}

impl Chain {
    /// Walk parent links from `terminal` up to `root`
    pub fn resolve(commands: &CommandSet, root: CommandId, terminal: CommandId) -> DispatchResult<Self> {
        // Stack of visited commands, leaf first
        let mut stack: Vec<CommandMetadata> = Vec::new();
        let mut current = terminal;

        loop {
            let meta = match commands.metadata(current) {
                Some(meta) => meta,
                None => return Err(integrity(format!("unknown command {}", current), &stack)),
            };
            if stack.iter().any(|seen| seen.id() == current) {
                stack.push(meta.clone());
                return Err(integrity("cycle detected".to_string(), &stack));
            }
            stack.push(meta.clone());

            if current == root {
                break;
            }
            current = match meta.parent() {
                Some(parent) => parent,
                None => {
                    return Err(integrity(
                        format!("chain does not reach the dispatch root {}", root),
                        &stack,
                    ))
                }
            };
        }

        stack.reverse();
        let links = stack
            .into_iter()
            .enumerate()
            .map(|(index, metadata)| ChainLink {
                metadata,
                parent: index.checked_sub(1),
            })
            .collect();
        Ok(Chain { links })
    }

    /// Fail if any link is currently disabled
    pub fn ensure_enabled(&self) -> DispatchResult<()> {
        match self.links.iter().find(|link| link.metadata.is_disabled()) {
            Some(link) => Err(DispatchError::CommandDisabled(link.metadata.name().to_string())),
            None => Ok(()),
        }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Number of links, root and leaf included
    pub fn depth(&self) -> usize {
        self.links.len()
    }

    pub fn leaf(&self) -> Option<&CommandMetadata> {
        self.links.last().map(|link| &link.metadata)
    }

    /// Command names root first
    pub fn names(&self) -> Vec<String> {
        self.links
            .iter()
            .map(|link| link.metadata.name().to_string())
            .collect()
    }
}

fn integrity(reason: String, stack: &[CommandMetadata]) -> DispatchError {
    let chain = stack
        .iter()
        .rev()
        .map(|meta| format!("{}{}", meta.name(), meta.id()))
        .collect();
    DispatchError::ChainIntegrity { reason, chain }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use crate::registry::{CommandInfo, Handler};

    fn record(id: usize, parent: Option<usize>, name: &str) -> CommandMetadata {
        CommandMetadata::from_info(
            CommandId::new(id),
            parent.map(CommandId::new),
            CommandInfo::new(name, Handler::noop()),
        )
    }

    fn set(records: Vec<CommandMetadata>) -> CommandSet {
        CommandSet::from_parts(ShellConfig::default(), records)
    }

    #[test]
    fn test_resolves_root_to_leaf() {
        let commands = set(vec![
            record(0, None, "server"),
            record(1, Some(0), "db"),
            record(2, Some(1), "migrate"),
        ]);
        let chain = Chain::resolve(&commands, CommandId::new(0), CommandId::new(2)).unwrap();
        assert_eq!(chain.names(), vec!["server", "db", "migrate"]);
        assert_eq!(chain.links()[0].parent, None);
        assert_eq!(chain.links()[2].parent, Some(1));
        assert_eq!(chain.leaf().unwrap().name(), "migrate");
    }

    #[test]
    fn test_terminal_is_root() {
        let commands = set(vec![record(0, None, "add")]);
        let chain = Chain::resolve(&commands, CommandId::new(0), CommandId::new(0)).unwrap();
        assert_eq!(chain.depth(), 1);
    }

    #[test]
    fn test_cycle_is_an_integrity_error() {
        let commands = set(vec![
            record(0, Some(1), "a"),
            record(1, Some(0), "b"),
            record(2, None, "root"),
        ]);
        let err = Chain::resolve(&commands, CommandId::new(2), CommandId::new(0)).unwrap_err();
        match err {
            DispatchError::ChainIntegrity { reason, chain } => {
                assert_eq!(reason, "cycle detected");
                assert_eq!(chain, vec!["a#0", "b#1", "a#0"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_parent_is_an_integrity_error() {
        let commands = set(vec![record(0, None, "root"), record(1, Some(9), "orphan")]);
        let err = Chain::resolve(&commands, CommandId::new(0), CommandId::new(1)).unwrap_err();
        assert!(matches!(err, DispatchError::ChainIntegrity { .. }));
    }

    #[test]
    fn test_disabled_link_is_reported() {
        let commands = set(vec![record(0, None, "server"), record(1, Some(0), "db")]);
        commands.metadata(CommandId::new(0)).unwrap().set_disabled(true);
        let chain = Chain::resolve(&commands, CommandId::new(0), CommandId::new(1)).unwrap();
        assert!(matches!(
            chain.ensure_enabled(),
            Err(DispatchError::CommandDisabled(name)) if name == "server"
        ));
    }
}
