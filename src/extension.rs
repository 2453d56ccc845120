//! Values produced by extension builders.
//!
//! An [`Extension`] either replaces the client's invocation handler or
//! contributes named values to its extension map.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::{ClientError, RequestOptions};

/// Future returned by a client handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, ClientError>> + Send>>;

/// Invocation handler called with the requested path and its options.
pub type Handler = Arc<dyn Fn(String, RequestOptions) -> HandlerFuture + Send + Sync>;

/// Callable stored in the extension map.
pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, ClientError> + Send + Sync>;

/// A value held in a client's extension map.
#[derive(Clone)]
pub enum ExtensionValue {
    /// Plain JSON data.
    Value(Value),
    /// A callable taking JSON arguments.
    Method(MethodFn),
    /// Named values grouped under one key, reachable with dotted names.
    Namespace(BTreeMap<String, ExtensionValue>),
}

impl ExtensionValue {
    /// Wraps a closure as a callable value.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ClientError> + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Returns the JSON data when this is a plain value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Finds `name` in `entries`.
///
/// An exact key wins; otherwise the name is split at its first `.` and the
/// rest is resolved inside the namespace stored under the head.
pub(crate) fn resolve<'a>(
    entries: &'a BTreeMap<String, ExtensionValue>,
    name: &str,
) -> Option<&'a ExtensionValue> {
    if let Some(value) = entries.get(name) {
        return Some(value);
    }
    let (head, rest) = name.split_once('.')?;
    match entries.get(head)? {
        ExtensionValue::Namespace(inner) => resolve(inner, rest),
        _ => None,
    }
}

/// Mutable counterpart of [`resolve`], following the same rules.
pub(crate) fn resolve_mut<'a>(
    entries: &'a mut BTreeMap<String, ExtensionValue>,
    name: &str,
) -> Option<&'a mut ExtensionValue> {
    if entries.contains_key(name) {
        return entries.get_mut(name);
    }
    let (head, rest) = name.split_once('.')?;
    match entries.get_mut(head)? {
        ExtensionValue::Namespace(inner) => resolve_mut(inner, rest),
        _ => None,
    }
}

impl From<Value> for ExtensionValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
            Self::Namespace(entries) => f.debug_tuple("Namespace").field(entries).finish(),
        }
    }
}

/// Named values contributed to a client by one extension.
///
/// `own` entries are copied into the client's extension map. `inherited`
/// entries stay with the extension: they are visible through the view
/// returned by [`crate::ApiClient::with`] but never overwrite map entries.
#[derive(Clone, Debug, Default)]
pub struct MethodsExtension {
    pub(crate) own: BTreeMap<String, ExtensionValue>,
    pub(crate) inherited: BTreeMap<String, ExtensionValue>,
}

impl MethodsExtension {
    /// Creates an extension with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable entry.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ClientError> + Send + Sync + 'static,
    {
        self.own.insert(name.into(), ExtensionValue::method(f));
        self
    }

    /// Adds a plain entry.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<ExtensionValue>) -> Self {
        self.own.insert(name.into(), value.into());
        self
    }

    /// Groups another extension's own entries under `name`.
    #[must_use]
    pub fn namespace(mut self, name: impl Into<String>, entries: MethodsExtension) -> Self {
        self.own
            .insert(name.into(), ExtensionValue::Namespace(entries.own));
        self
    }

    /// Adds a member that is reachable from the returned view only.
    #[must_use]
    pub fn inherit(mut self, name: impl Into<String>, value: impl Into<ExtensionValue>) -> Self {
        self.inherited.insert(name.into(), value.into());
        self
    }
}

/// Result of an extension builder.
#[derive(Clone)]
pub enum Extension {
    /// Becomes the client's invocation handler.
    Handler(Handler),
    /// Merged into the client's extension map.
    Methods(MethodsExtension),
}

impl Extension {
    /// Wraps an async closure as a handler extension.
    pub fn handler<F, Fut>(f: F) -> Self
    where
        F: Fn(String, RequestOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let handler: Handler =
            Arc::new(move |path: String, options: RequestOptions| -> HandlerFuture {
                Box::pin(f(path, options))
            });
        Self::Handler(handler)
    }
}

impl From<MethodsExtension> for Extension {
    fn from(methods: MethodsExtension) -> Self {
        Self::Methods(methods)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Methods(methods) => f.debug_tuple("Methods").field(methods).finish(),
        }
    }
}
