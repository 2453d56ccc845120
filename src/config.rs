use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ClientOptions, SchemaError};

/// Default configuration file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "apiful.config.json";

/// Project configuration listing the `OpenAPI` services in use.
///
/// ```json
/// {
///   "services": {
///     "petStore": { "schema": "schemas/pet-store.json", "baseURL": "https://petstore.example" }
///   }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ApifulConfig {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// One service entry of [`ApifulConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Path or URL of the service's `OpenAPI` document.
    pub schema: PathBuf,
    #[serde(rename = "baseURL", default)]
    pub base_url: Option<String>,
}

impl ApifulConfig {
    /// Parses a configuration document.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Looks up a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }
}

impl ServiceConfig {
    /// Client options seeded with this service's base URL.
    pub fn client_options(&self) -> ClientOptions {
        match &self.base_url {
            Some(url) => ClientOptions::new().with_base_url(url.clone()),
            None => ClientOptions::new(),
        }
    }
}
