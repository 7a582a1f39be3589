//! Host-supplied transform functions.
//!
//! A transform is applied with pipe syntax, `subject|name(arg, ...)`, and
//! receives the evaluated subject followed by the evaluated arguments.
//! Transforms may complete synchronously or asynchronously; the evaluator
//! always awaits them.
use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use futures::{
    FutureExt,
    future::{self, BoxFuture},
};

use crate::value::Value;

/// Failure reported by a transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

pub type TransformResult = Result<Value, TransformError>;

/// A named function the host registers into the engine.
pub trait Transform: Send + Sync {
    fn apply(&self, subject: Value, args: Vec<Value>) -> BoxFuture<'static, TransformResult>;
}

/// Adapter for transforms that complete immediately.
pub struct SyncTransform<F>(pub F);

impl<F> Transform for SyncTransform<F>
where
    F: Fn(Value, Vec<Value>) -> TransformResult + Send + Sync,
{
    fn apply(&self, subject: Value, args: Vec<Value>) -> BoxFuture<'static, TransformResult> {
        future::ready((self.0)(subject, args)).boxed()
    }
}

/// Adapter for transforms that return a future.
pub struct AsyncTransform<F>(pub F);

impl<F, Fut> Transform for AsyncTransform<F>
where
    F: Fn(Value, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = TransformResult> + Send + 'static,
{
    fn apply(&self, subject: Value, args: Vec<Value>) -> BoxFuture<'static, TransformResult> {
        (self.0)(subject, args).boxed()
    }
}

/// The transform table consulted during evaluation.
///
/// Cloning is cheap: entries are shared.
///
/// # Examples
///
/// ```
/// use jexl_lang::{Transforms, Value};
///
/// let mut transforms = Transforms::new();
/// transforms.add_sync("lower", |subject, _args| {
///     Ok(Value::String(subject.to_js_string().to_lowercase()))
/// });
/// assert!(transforms.contains("lower"));
/// ```
#[derive(Clone, Default)]
pub struct Transforms {
    table: HashMap<String, Arc<dyn Transform>>,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T>(&mut self, name: &str, transform: T)
    where
        T: Transform + 'static,
    {
        self.table.insert(name.to_string(), Arc::new(transform));
    }

    /// Register a transform that completes immediately.
    pub fn add_sync<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Value, Vec<Value>) -> TransformResult + Send + Sync + 'static,
    {
        self.insert(name, SyncTransform(f));
    }

    /// Register a transform that returns a future.
    pub fn add_async<F, Fut>(&mut self, name: &str, f: F)
    where
        F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransformResult> + Send + 'static,
    {
        self.insert(name, AsyncTransform(f));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transform>> {
        self.table.get(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.table.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transforms")
            .field("names", &self.names())
            .finish()
    }
}
