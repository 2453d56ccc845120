use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{ClientError, ClientOptions, RequestOptions};

/// Async JSON transport configured from [`ClientOptions`].
///
/// Paths are joined onto the base URL. Without a base URL every path must be
/// an absolute URL.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: Option<Url>,
    default_query: Vec<(String, String)>,
    authorization_token: Option<String>,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport from client options.
    ///
    /// The base URL is normalized to include a trailing slash, so relative
    /// endpoint paths join correctly.
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base_url = options
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map(ensure_trailing_slash)
                    .map_err(|_| ClientError::InvalidBaseUrl(raw.to_owned()))
            })
            .transpose()?;

        let http = reqwest::Client::builder()
            .default_headers(header_map(&options.headers)?)
            .build()?;

        Ok(Self {
            base_url,
            default_query: options.query.clone(),
            authorization_token: options.authorization_token.clone(),
            http,
        })
    }

    /// Sends a request and parses the response as JSON.
    ///
    /// The method defaults to `GET`. Returns [`Value::Null`] for successful
    /// responses with an empty body.
    #[instrument(skip(self, options), fields(method = tracing::field::Empty))]
    pub async fn fetch(&self, path: &str, options: &RequestOptions) -> Result<Value, ClientError> {
        let method = options.method.clone().unwrap_or(Method::GET);
        tracing::Span::current().record("method", method.as_str());

        let url = self.build_url(path)?;
        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .headers(header_map(&options.headers)?);

        if !self.default_query.is_empty() {
            request = request.query(&self.default_query);
        }

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }

        if let Some(token) = &self.authorization_token {
            request = request.bearer_auth(token);
        }

        if let Some(json_body) = &options.body {
            request = request.json(json_body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload = response.text().await?;
        debug!(%status, bytes = payload.len(), "received response");

        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status,
                body: payload,
            });
        }

        if payload.trim().is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_str(&payload)?)
        }
    }

    fn build_url(&self, path: &str) -> Result<Url, ClientError> {
        match &self.base_url {
            Some(base_url) => base_url
                .join(path.trim_start_matches('/'))
                .map_err(|_| ClientError::InvalidPath(path.to_owned())),
            None => Url::parse(path).map_err(|_| ClientError::InvalidPath(path.to_owned())),
        }
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::try_from(name.as_str())
            .map_err(|_| ClientError::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::try_from(value.as_str())
            .map_err(|_| ClientError::InvalidHeader(name.clone()))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_owned();
        path.push('/');
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::HttpTransport;
    use crate::{ClientError, ClientOptions};

    #[test]
    fn joins_paths_from_base_with_nested_prefix() {
        let options = ClientOptions::new().with_base_url("https://example.com/api/v1");
        let transport = HttpTransport::new(&options).expect("valid url");
        let resolved = transport.build_url("/items").expect("valid path");
        assert_eq!(resolved.as_str(), "https://example.com/api/v1/items");
    }

    #[test]
    fn absolute_paths_work_without_base_url() {
        let transport = HttpTransport::new(&ClientOptions::new()).expect("no base url");
        let resolved = transport
            .build_url("https://example.com/pets/1")
            .expect("absolute url");
        assert_eq!(resolved.as_str(), "https://example.com/pets/1");
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let options = ClientOptions::new().with_base_url("/api");
        assert!(matches!(
            HttpTransport::new(&options),
            Err(ClientError::InvalidBaseUrl(url)) if url == "/api"
        ));
    }

    #[test]
    fn invalid_default_header_is_rejected() {
        let options = ClientOptions::new().with_header("bad header", "x");
        assert!(matches!(
            HttpTransport::new(&options),
            Err(ClientError::InvalidHeader(_))
        ));
    }
}
