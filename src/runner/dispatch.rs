//! Dispatch engine
//!
//! One dispatch is a single parse of the token list against the tree rooted
//! at the dispatch root, followed by a root-to-leaf run of the matched chain.
//! Each handler sees the previous link's result; the leaf's result is
//! returned.

use crate::error::{DispatchError, DispatchResult};
use crate::parser::Namespace;
use crate::registry::{Call, CommandId, CommandMetadata, CommandSet, Handler, HandlerResult};
use crate::runner::Chain;
use crate::signature::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Parse `argv` and run the matched chain, driving async handlers to completion
///
/// Async handlers are polled on the calling thread with no runtime around
/// them. A handler that needs a tokio reactor (timers, sockets) panics here;
/// use [`dispatch_async`] from inside the runtime instead.
pub fn dispatch(commands: &CommandSet, root: CommandId, argv: &[String]) -> DispatchResult<Value> {
    let (chain, namespace) = prepare(commands, root, argv)?;
    let depth = chain.depth();
    let mut previous = Value::None;

    for (position, link) in chain.links().iter().enumerate() {
        let meta = &link.metadata;
        let call = link_call(commands, meta, &namespace, std::mem::take(&mut previous), position, depth);
        trace!(command = %meta.name(), position, "running handler");
        let outcome = match meta.handler() {
            Handler::Sync(handler) => handler(&call),
            Handler::Async(handler) => futures::executor::block_on(handler(call)),
        };
        previous = finish(meta, position, outcome)?;
    }

    Ok(previous)
}

/// Parse `argv` and await each link of the matched chain in order
///
/// Dropping the returned future cancels the handler in flight; links after
/// it never run.
pub async fn dispatch_async(commands: &CommandSet, root: CommandId, argv: &[String]) -> DispatchResult<Value> {
    let (chain, namespace) = prepare(commands, root, argv)?;
    let depth = chain.depth();
    let mut previous = Value::None;

    for (position, link) in chain.links().iter().enumerate() {
        let meta = &link.metadata;
        let call = link_call(commands, meta, &namespace, std::mem::take(&mut previous), position, depth);
        trace!(command = %meta.name(), position, "awaiting handler");
        let outcome = match meta.handler() {
            Handler::Sync(handler) => handler(&call),
            Handler::Async(handler) => handler(call).await,
        };
        previous = finish(meta, position, outcome)?;
    }

    Ok(previous)
}

/// Parse, resolve the chain and check it can run; no handler is touched
pub fn prepare(commands: &CommandSet, root: CommandId, argv: &[String]) -> DispatchResult<(Chain, Arc<Namespace>)> {
    let meta = commands
        .metadata(root)
        .ok_or_else(|| DispatchError::UnknownCommand(root.to_string()))?;

    let namespace = match commands.parser_tree(root) {
        Some(tree) => tree.parse(argv).map_err(|err| {
            debug!(command = %meta.name(), kind = ?err.kind, "parse failed");
            err
        })?,
        None => Namespace::raw(root, meta.name(), argv),
    };

    let terminal = namespace.terminal().unwrap_or(root);
    let chain = Chain::resolve(commands, root, terminal)?;
    chain.ensure_enabled()?;
    debug!(chain = ?chain.names(), "resolved command chain");

    Ok((chain, Arc::new(namespace)))
}

fn link_call(
    commands: &CommandSet,
    meta: &CommandMetadata,
    namespace: &Arc<Namespace>,
    previous: Value,
    position: usize,
    depth: usize,
) -> Call {
    Call::new(
        commands.clone(),
        meta.id(),
        meta.name(),
        Arc::clone(namespace),
        previous,
        position,
        depth,
    )
}

fn finish(meta: &CommandMetadata, position: usize, outcome: HandlerResult) -> DispatchResult<Value> {
    outcome.map_err(|source| {
        warn!(command = %meta.name(), position, error = %source, "handler failed");
        DispatchError::Execution {
            position,
            command: meta.name().to_string(),
            source,
        }
    })
}
