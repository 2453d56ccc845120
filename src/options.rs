use std::fmt::Display;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default options captured when a client is created.
///
/// Options are stored verbatim; nothing is validated until a transport is
/// built from them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Base URL every request path is joined onto.
    #[serde(rename = "baseURL", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Headers sent with every request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Query pairs sent with every request, before per-request pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    /// Access token sent as a bearer `Authorization` header.
    #[serde(skip)]
    pub authorization_token: Option<String>,
}

impl ClientOptions {
    /// Creates options with no base URL, headers, query or token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options targeting `base_url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Returns options sending the header on every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns options adding the query parameter to every request.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Returns options with an access token attached to all requests.
    #[must_use]
    pub fn with_authorization_token(mut self, token: impl Into<String>) -> Self {
        self.authorization_token = Some(token.into());
        self
    }
}

/// Per-invocation options passed to a client handler.
///
/// `path` holds the values substituted into `{name}` placeholders of the
/// requested path template, in insertion order. Everything else is handed to
/// the transport unchanged.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// HTTP method. When unset, the handler picks one.
    pub method: Option<Method>,
    pub path: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<Value>,
}

impl RequestOptions {
    /// Creates empty per-call options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a path parameter; the value is converted with its `Display` impl.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.path.push((name.into(), value.to_string()));
        self
    }

    /// Adds a query parameter for this call.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Adds a header for this call.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sends `body` as the JSON request body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ClientOptions, RequestOptions};

    #[test]
    fn client_options_serialize_without_token() {
        let options = ClientOptions::new()
            .with_base_url("/api")
            .with_authorization_token("secret");
        let value = serde_json::to_value(&options).expect("serializable");
        assert_eq!(value, json!({ "baseURL": "/api" }));
    }

    #[test]
    fn path_params_keep_insertion_order() {
        let options = RequestOptions::new()
            .path_param("owner", "rust-lang")
            .path_param("id", 42);
        assert_eq!(
            options.path,
            vec![
                ("owner".to_owned(), "rust-lang".to_owned()),
                ("id".to_owned(), "42".to_owned()),
            ]
        );
    }
}
