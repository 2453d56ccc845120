use std::marker::PhantomData;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::extension::Extension;
use crate::transport::HttpTransport;
use crate::{ApiClient, ClientError, ClientOptions, RequestOptions, resolve_path};

/// Metadata for one `OpenAPI` operation.
#[derive(Clone, Copy, Debug)]
pub struct OperationDefinition {
    /// Stable `OpenAPI` operation identifier.
    pub operation_id: &'static str,
    /// Uppercase HTTP method (for example `GET`, `POST`).
    pub method: &'static str,
    /// Path template, potentially containing `{param}` placeholders.
    pub path_template: &'static str,
    /// Path parameter names extracted from `path_template`.
    pub path_params: &'static [&'static str],
}

/// Type-level identifier of an `OpenAPI` schema.
///
/// Implementors usually come from generated code and carry the operation
/// table of their document.
pub trait PathSchema {
    /// Service name the schema was registered under.
    const NAME: &'static str;

    /// Operations declared by the document; empty when untyped.
    fn operations() -> &'static [OperationDefinition] {
        &[]
    }

    /// Looks up the method declared for `path_template`.
    fn method_for(path_template: &str) -> Option<Method> {
        Self::operations()
            .iter()
            .find(|op| op.path_template == path_template)
            .and_then(|op| Method::from_bytes(op.method.as_bytes()).ok())
    }
}

/// Schema identifier for services without an operation table.
#[derive(Clone, Copy, Debug, Default)]
pub struct Untyped;

impl PathSchema for Untyped {
    const NAME: &'static str = "untyped";
}

/// Path-aware client for one `OpenAPI` service.
///
/// Each call resolves `{param}` placeholders from [`RequestOptions::path`]
/// and forwards everything else to the transport.
#[derive(Debug)]
pub struct OpenApiClient<S = Untyped> {
    transport: HttpTransport,
    schema: PhantomData<fn() -> S>,
}

impl<S> Clone for OpenApiClient<S> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            schema: PhantomData,
        }
    }
}

impl<S: PathSchema> OpenApiClient<S> {
    /// Builds the HTTP transport from `default_options`.
    pub fn new(default_options: &ClientOptions) -> Result<Self, ClientError> {
        Ok(Self {
            transport: HttpTransport::new(default_options)?,
            schema: PhantomData,
        })
    }

    /// Sends a request to `path` after substituting its path parameters.
    ///
    /// Without an explicit method, the method declared for the template in
    /// the schema's operation table is used, then `GET`.
    pub async fn call(&self, path: &str, mut options: RequestOptions) -> Result<Value, ClientError> {
        if options.method.is_none() {
            options.method = S::method_for(path);
        }

        let resolved = resolve_path(path, &options.path);
        debug!(schema = S::NAME, template = path, %resolved, "resolved request path");
        self.transport.fetch(&resolved, &options).await
    }
}

/// Creates a standalone `OpenAPI` client without going through
/// [`ApiClient::with`].
pub fn create_openapi_client<S: PathSchema>(
    default_options: &ClientOptions,
) -> Result<OpenApiClient<S>, ClientError> {
    OpenApiClient::new(default_options)
}

/// Returns an extension builder that installs an `OpenAPI` handler.
///
/// The transport is configured from the client's default options once, when
/// the builder runs; later invocations share it.
///
/// ```rust,ignore
/// let client = create_client(ClientOptions::new().with_base_url("https://petstore.example"))
///     .try_with(openapi::<PetStore>())?;
/// let pet = client
///     .invoke("/pets/{id}", RequestOptions::new().path_param("id", 42))
///     .await?;
/// ```
pub fn openapi<S>() -> impl FnOnce(&ApiClient) -> Result<Extension, ClientError>
where
    S: PathSchema + 'static,
{
    |client: &ApiClient| {
        let service = OpenApiClient::<S>::new(client.default_options())?;
        debug!(schema = S::NAME, "built OpenAPI handler");
        Ok(Extension::handler(move |path, options| {
            let service = service.clone();
            async move { service.call(&path, options).await }
        }))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::{OperationDefinition, PathSchema, Untyped, openapi};
    use crate::{ClientError, ClientOptions, create_client};

    struct PetStore;

    impl PathSchema for PetStore {
        const NAME: &'static str = "petStore";

        fn operations() -> &'static [OperationDefinition] {
            &[
                OperationDefinition {
                    operation_id: "listPets",
                    method: "GET",
                    path_template: "/pets",
                    path_params: &[],
                },
                OperationDefinition {
                    operation_id: "deletePet",
                    method: "DELETE",
                    path_template: "/pets/{id}",
                    path_params: &["id"],
                },
            ]
        }
    }

    #[test]
    fn method_comes_from_operation_table() {
        assert_eq!(PetStore::method_for("/pets/{id}"), Some(Method::DELETE));
        assert_eq!(PetStore::method_for("/owners"), None);
        assert_eq!(Untyped::method_for("/pets"), None);
    }

    #[test]
    fn builder_installs_handler() {
        let client = create_client(ClientOptions::new().with_base_url("https://example.com"));
        let client = client.try_with(openapi::<PetStore>()).expect("valid options");
        assert!(client.has_handler());
    }

    #[test]
    fn builder_reports_invalid_base_url_without_installing() {
        let client = create_client(ClientOptions::new().with_base_url("not a url"));
        let result = client.try_with(openapi::<Untyped>());
        assert!(matches!(result, Err(ClientError::InvalidBaseUrl(_))));
        assert!(!client.has_handler());
    }
}
