//! Backends that describe a datasource by name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashprobe_api::{ClientError, ConsoleClient, datasource_lookup_path};
use dashprobe_types::{DataSource, DatasourceMetadata, DatasourcePlugin, DatasourceSpec};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

/// Errors produced while fetching or decoding a datasource document.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("datasource request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("datasource lookup returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("cannot decode datasource document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("datasource not found: {0}")]
    NotFound(String),

    #[error("cannot read datasource file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse datasource file '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Source of datasource documents consulted on a resolver cache miss.
#[async_trait]
pub trait DatasourceLookup: Send + Sync {
    async fn lookup(&self, datasource_name: &str) -> Result<DataSource, LookupError>;

    /// Short label used in logs.
    fn describe(&self) -> String;
}

/// Fetches datasource documents from the plugin backend through the console proxy.
#[derive(Debug, Clone)]
pub struct HttpDatasourceLookup {
    client: ConsoleClient,
}

impl HttpDatasourceLookup {
    pub fn new(client: ConsoleClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DatasourceLookup for HttpDatasourceLookup {
    async fn lookup(&self, datasource_name: &str) -> Result<DataSource, LookupError> {
        let path = datasource_lookup_path(datasource_name);
        let request = self.client.request(Method::GET, &path)?;

        debug!(datasource = datasource_name, %path, "fetching datasource document");
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status,
                body: body.trim().to_string(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn describe(&self) -> String {
        format!("http({})", self.client.base_url)
    }
}

/// Synthesizes documents with a fixed plugin kind and never touches the
/// network. Useful when the backend endpoint is not reachable from a local
/// console development server.
#[derive(Debug, Clone)]
pub struct FixedKindLookup {
    kind: String,
}

impl FixedKindLookup {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

#[async_trait]
impl DatasourceLookup for FixedKindLookup {
    async fn lookup(&self, datasource_name: &str) -> Result<DataSource, LookupError> {
        Ok(DataSource {
            kind: "Datasource".to_string(),
            metadata: DatasourceMetadata {
                name: datasource_name.to_string(),
                namespace: None,
            },
            spec: DatasourceSpec {
                plugin: DatasourcePlugin {
                    kind: self.kind.clone(),
                    ..Default::default()
                },
            },
        })
    }

    fn describe(&self) -> String {
        format!("fixed({})", self.kind)
    }
}

/// Serves datasource documents loaded from `dashboard-datasource.yaml` files.
///
/// Documents are keyed by `metadata.name`; a later file overrides an earlier
/// one with the same name.
#[derive(Debug, Clone, Default)]
pub struct YamlDatasourceLookup {
    datasources: HashMap<String, DataSource>,
}

impl YamlDatasourceLookup {
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LookupError> {
        let mut lookup = Self::default();
        for path in paths {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|source| LookupError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let datasource: DataSource = serde_yaml::from_str(&content).map_err(|source| LookupError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
            info!(datasource = %datasource.metadata.name, path = %path.display(), "datasource loaded");
            lookup.insert(datasource);
        }
        Ok(lookup)
    }

    pub fn insert(&mut self, datasource: DataSource) {
        self.datasources.insert(datasource.metadata.name.clone(), datasource);
    }

    pub fn len(&self) -> usize {
        self.datasources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasources.is_empty()
    }
}

#[async_trait]
impl DatasourceLookup for YamlDatasourceLookup {
    async fn lookup(&self, datasource_name: &str) -> Result<DataSource, LookupError> {
        self.datasources
            .get(datasource_name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(datasource_name.to_string()))
    }

    fn describe(&self) -> String {
        format!("yaml({} datasources)", self.datasources.len())
    }
}
