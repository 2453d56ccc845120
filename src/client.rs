use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde_json::Value;
use tracing::debug;

use crate::extension::{
    Extension, ExtensionValue, Handler, MethodsExtension, resolve, resolve_mut,
};
use crate::{ClientError, ClientOptions, RequestOptions};

/// Creates a client with no handler and an empty extension map.
pub fn create_client(default_options: ClientOptions) -> ApiClient {
    ApiClient::new(default_options)
}

/// A callable client that grows through extensions.
///
/// Cloning an `ApiClient` yields another handle to the same client: handler
/// and extension map are shared, so a handler that captured a clone sees
/// extensions added after it was installed.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientState>,
}

struct ClientState {
    default_options: ClientOptions,
    handler: RwLock<Option<Handler>>,
    extensions: RwLock<BTreeMap<String, ExtensionValue>>,
}

impl ApiClient {
    /// Creates a client holding `default_options` as given.
    pub fn new(default_options: ClientOptions) -> Self {
        Self {
            inner: Arc::new(ClientState {
                default_options,
                handler: RwLock::new(None),
                extensions: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Returns the options the client was created with.
    pub fn default_options(&self) -> &ClientOptions {
        &self.inner.default_options
    }

    /// Applies the extension produced by `builder` and returns a view of
    /// this client.
    ///
    /// A handler extension replaces the current handler. A methods extension
    /// copies its own entries into the extension map, overwriting entries
    /// with the same name.
    pub fn with<F, E>(&self, builder: F) -> ExtendedClient
    where
        F: FnOnce(&ApiClient) -> E,
        E: Into<Extension>,
    {
        let extension = builder(self).into();
        self.apply(extension)
    }

    /// Fallible form of [`Self::with`].
    ///
    /// The builder runs before any client state is touched, so an error
    /// leaves the client as it was.
    pub fn try_with<F, E, Err>(&self, builder: F) -> Result<ExtendedClient, Err>
    where
        F: FnOnce(&ApiClient) -> Result<E, Err>,
        E: Into<Extension>,
    {
        let extension = builder(self)?.into();
        Ok(self.apply(extension))
    }

    /// Invokes the client.
    ///
    /// Dispatches to the current handler. Without one, the call is a no-op
    /// that resolves to [`Value::Null`].
    pub async fn invoke(
        &self,
        path: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Value, ClientError> {
        let handler = self
            .inner
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(path.into(), options).await,
            None => {
                debug!("client invoked without a handler");
                Ok(Value::Null)
            }
        }
    }

    /// Returns whether a handler extension has been applied.
    pub fn has_handler(&self) -> bool {
        self.inner
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the extension-map entry for `name`.
    ///
    /// An exact key wins; otherwise dotted names descend into namespaces.
    pub fn extension(&self, name: &str) -> Option<ExtensionValue> {
        resolve(&self.read_extensions(), name).cloned()
    }

    /// Returns the top-level keys of the extension map.
    pub fn extension_names(&self) -> Vec<String> {
        self.read_extensions().keys().cloned().collect()
    }

    fn apply(&self, extension: Extension) -> ExtendedClient {
        match extension {
            Extension::Handler(handler) => {
                let previous = self
                    .inner
                    .handler
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(handler);
                debug!(replaced = previous.is_some(), "installed client handler");
                ExtendedClient {
                    client: self.clone(),
                    last: BTreeMap::new(),
                }
            }
            Extension::Methods(MethodsExtension { own, inherited }) => {
                let mut last = inherited;
                {
                    let mut extensions = self
                        .inner
                        .extensions
                        .write()
                        .unwrap_or_else(PoisonError::into_inner);
                    for (key, value) in own {
                        last.insert(key.clone(), value.clone());
                        extensions.insert(key, value);
                    }
                    debug!(total = extensions.len(), "merged methods extension");
                }
                ExtendedClient {
                    client: self.clone(),
                    last,
                }
            }
        }
    }

    fn read_extensions(&self) -> RwLockReadGuard<'_, BTreeMap<String, ExtensionValue>> {
        self.inner
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn base_property(&self, name: &str) -> Option<ExtensionValue> {
        match name {
            "default_options" => serde_json::to_value(self.default_options())
                .ok()
                .map(ExtensionValue::Value),
            "base_url" => self
                .default_options()
                .base_url
                .clone()
                .map(|url| ExtensionValue::Value(Value::String(url))),
            _ => None,
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("default_options", self.default_options())
            .field("extensions", &self.extension_names())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// View of an [`ApiClient`] returned by [`ApiClient::with`].
///
/// Property reads resolve against the extension map first, then the
/// client's base fields (`default_options`, `base_url`), then the members of
/// the extension that produced this view.
#[derive(Clone, Debug)]
pub struct ExtendedClient {
    client: ApiClient,
    last: BTreeMap<String, ExtensionValue>,
}

impl ExtendedClient {
    /// Reads a property, resolving names the same way [`Self::set`] does.
    pub fn get(&self, name: &str) -> Option<ExtensionValue> {
        self.client
            .extension(name)
            .or_else(|| self.client.base_property(name))
            .or_else(|| resolve(&self.last, name).cloned())
    }

    /// Writes a property.
    ///
    /// Names already in the extension map, including members of its
    /// namespaces, are updated there and visible to every view of the
    /// client. Other names land on this view only.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ExtensionValue>) {
        let name = name.into();
        let value = value.into();

        {
            let mut extensions = self
                .client
                .inner
                .extensions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = resolve_mut(&mut extensions, &name) {
                *slot = value;
                return;
            }
        }

        match resolve_mut(&mut self.last, &name) {
            Some(slot) => *slot = value,
            None => {
                self.last.insert(name, value);
            }
        }
    }

    /// Calls the callable property `name` with `args`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ClientError> {
        match self.get(name) {
            Some(ExtensionValue::Method(method)) => method(args),
            _ => Err(ClientError::UnknownMethod(name.to_owned())),
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Consumes the view, keeping the underlying client.
    pub fn into_client(self) -> ApiClient {
        self.client
    }
}

impl Deref for ExtendedClient {
    type Target = ApiClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
