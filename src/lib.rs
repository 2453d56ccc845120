//! Extensible HTTP API clients and JSON-driven type generation.
//!
//! Public API layers:
//! - [`ApiClient`]: a callable client grown through [`ApiClient::with`].
//! - [`openapi()`]: extension builder installing a path-aware `OpenAPI` handler.
//! - [`resolve_path`]: `{param}` placeholder substitution.
//! - [`infer_schema`]/[`merge_schemas`]: structural schemas from JSON samples.
//! - [`generate_type_from_schema`]: declarations through a [`TypeCompiler`].
//! - [`ClientError`]/[`SchemaError`]: error types used across the crate.

mod client;
mod config;
mod error;
pub mod extension;
mod openapi;
mod options;
mod path;
pub mod schema;
mod transport;
mod typegen;

/// Extensible client and the view returned by extension.
pub use client::{ApiClient, ExtendedClient, create_client};
/// Service configuration file.
pub use config::{ApifulConfig, DEFAULT_CONFIG_FILE, ServiceConfig};
/// Error types.
pub use error::{ClientError, SchemaError};
/// Extension builder results and extension map values.
pub use extension::{Extension, ExtensionValue, MethodsExtension};
/// `OpenAPI` handler, standalone client and schema ids.
pub use openapi::{
    OpenApiClient, OperationDefinition, PathSchema, Untyped, create_openapi_client, openapi,
};
/// Client-wide and per-call options.
pub use options::{ClientOptions, RequestOptions};
/// Path placeholder substitution.
pub use path::resolve_path;
/// Schema inference and merging.
pub use schema::{Schema, infer_schema, merge_schemas};
/// HTTP transport.
pub use transport::HttpTransport;
/// Type declaration generation.
pub use typegen::{
    TypeCompiler, TypeScriptCompiler, generate_type_from_json, generate_type_from_schema,
};
