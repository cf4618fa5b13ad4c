//! Command handlers and the call context they receive

use crate::parser::Namespace;
use crate::registry::{CommandId, CommandSet};
use crate::signature::Value;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What a handler returns
pub type HandlerResult = anyhow::Result<Value>;

type SyncFn = dyn Fn(&Call) -> HandlerResult + Send + Sync;
type AsyncFn = dyn Fn(Call) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A callable implementing one command's behavior
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Handler {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Call) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Sync(Arc::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::Async(Arc::new(move |call| f(call).boxed()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Handler::Async(_))
    }

    /// A handler that does nothing and returns [`Value::None`]
    pub fn noop() -> Self {
        Handler::sync(|_| Ok(Value::None))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Sync(_) => f.write_str("Handler::Sync"),
            Handler::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// Context handed to each handler in a chain
#[derive(Clone)]
pub struct Call {
    owner: CommandSet,
    command: CommandId,
    name: String,
    namespace: Arc<Namespace>,
    previous: Value,
    position: usize,
    depth: usize,
}

impl Call {
    pub(crate) fn new(
        owner: CommandSet,
        command: CommandId,
        name: &str,
        namespace: Arc<Namespace>,
        previous: Value,
        position: usize,
        depth: usize,
    ) -> Self {
        Call {
            owner,
            command,
            name: name.to_string(),
            namespace,
            previous,
            position,
            depth,
        }
    }

    /// The command set this handler belongs to
    pub fn owner(&self) -> &CommandSet {
        &self.owner
    }

    pub fn command(&self) -> CommandId {
        self.command
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Result of the preceding chain link; [`Value::None`] at the root
    pub fn previous(&self) -> &Value {
        &self.previous
    }

    /// Position of this link in the chain, root = 0
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of links in the chain
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this link's result becomes the dispatch result
    pub fn is_leaf(&self) -> bool {
        self.position + 1 == self.depth
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.namespace.get(key)
    }

    pub fn value(&self, key: &str) -> &Value {
        self.namespace.value(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.namespace.get_str(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.namespace.get_int(key)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.namespace.get_float(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.namespace.flag(key)
    }

    /// Tokens passed to a parser-less command
    pub fn argv(&self) -> &[String] {
        self.namespace.rest()
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("command", &self.name)
            .field("position", &self.position)
            .field("depth", &self.depth)
            .field("previous", &self.previous)
            .field("namespace", &self.namespace)
            .finish()
    }
}
